pub mod tuple;
pub mod value;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;

pub type ColumnId = u32;

/// Sql data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    SqlNull,
    Boolean,
    Integer,
    Bigint,
    Double,
    /// precision, scale
    Decimal(Option<u8>, Option<u8>),
    Varchar(Option<u32>),
    Date,
    DateTime,
    Tuple,
}

impl LogicalType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::Integer
                | LogicalType::Bigint
                | LogicalType::Double
                | LogicalType::Decimal(_, _)
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, LogicalType::Date | LogicalType::DateTime)
    }

    /// Types with an order preserving byte encoding, usable in a row key.
    pub fn can_be_primary_key(&self) -> bool {
        matches!(
            self,
            LogicalType::Boolean
                | LogicalType::Integer
                | LogicalType::Bigint
                | LogicalType::Double
                | LogicalType::Varchar(_)
                | LogicalType::Date
                | LogicalType::DateTime
        )
    }

    /// Result type of an arithmetic expression over two numeric types.
    pub fn max_numeric_type(left: &LogicalType, right: &LogicalType) -> Option<LogicalType> {
        if !left.is_numeric() || !right.is_numeric() {
            return None;
        }
        let rank = |ty: &LogicalType| match ty {
            LogicalType::Integer => 0,
            LogicalType::Bigint => 1,
            LogicalType::Decimal(_, _) => 2,
            _ => 3,
        };

        Some(if rank(left) >= rank(right) {
            *left
        } else {
            *right
        })
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LogicalType::SqlNull => write!(f, "NULL"),
            LogicalType::Boolean => write!(f, "BOOLEAN"),
            LogicalType::Integer => write!(f, "INTEGER"),
            LogicalType::Bigint => write!(f, "BIGINT"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::Decimal(Some(precision), Some(scale)) => {
                write!(f, "DECIMAL({}, {})", precision, scale)
            }
            LogicalType::Decimal(_, _) => write!(f, "DECIMAL"),
            LogicalType::Varchar(Some(len)) => write!(f, "VARCHAR({})", len),
            LogicalType::Varchar(None) => write!(f, "VARCHAR"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::DateTime => write!(f, "DATETIME"),
            LogicalType::Tuple => write!(f, "TUPLE"),
        }
    }
}
