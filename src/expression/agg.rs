use crate::errors::DatabaseError;
use crate::types::LogicalType;
use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggKind {
    Max,
    Min,
    Sum,
    Count,
}

impl AggKind {
    pub fn allow_distinct(&self) -> bool {
        match self {
            AggKind::Max => false,
            AggKind::Min => false,
            AggKind::Sum => true,
            AggKind::Count => true,
        }
    }

    pub fn from_name(name: &str) -> Option<AggKind> {
        match name {
            "max" => Some(AggKind::Max),
            "min" => Some(AggKind::Min),
            "sum" => Some(AggKind::Sum),
            "count" => Some(AggKind::Count),
            _ => None,
        }
    }

    pub fn return_type(&self, arg_type: &LogicalType) -> Result<LogicalType, DatabaseError> {
        Ok(match self {
            AggKind::Count => LogicalType::Bigint,
            AggKind::Sum => match arg_type {
                LogicalType::Integer | LogicalType::Bigint | LogicalType::SqlNull => {
                    LogicalType::Bigint
                }
                LogicalType::Double => LogicalType::Double,
                LogicalType::Decimal(_, scale) => LogicalType::Decimal(None, *scale),
                _ => return Err(DatabaseError::InvalidType),
            },
            AggKind::Max | AggKind::Min => *arg_type,
        })
    }
}

impl fmt::Display for AggKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            AggKind::Max => write!(f, "max"),
            AggKind::Min => write!(f, "min"),
            AggKind::Sum => write!(f, "sum"),
            AggKind::Count => write!(f, "count"),
        }
    }
}
