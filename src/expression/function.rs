use crate::errors::DatabaseError;
use crate::expression::ScalarExpression;
use crate::types::value::{DataValue, ValueRef};
use crate::types::LogicalType;
use std::fmt;
use std::fmt::Formatter;

/// Built-in scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Upper,
    Lower,
    Length,
    Abs,
    Coalesce,
}

impl FunctionKind {
    pub fn from_name(name: &str) -> Option<FunctionKind> {
        match name {
            "upper" => Some(FunctionKind::Upper),
            "lower" => Some(FunctionKind::Lower),
            "length" | "char_length" => Some(FunctionKind::Length),
            "abs" => Some(FunctionKind::Abs),
            "coalesce" => Some(FunctionKind::Coalesce),
            _ => None,
        }
    }

    pub fn return_type(&self, args: &[ScalarExpression]) -> Result<LogicalType, DatabaseError> {
        let arity = |expected: usize| {
            if args.len() != expected {
                return Err(DatabaseError::MisMatch(expected, args.len()));
            }
            Ok(())
        };

        match self {
            FunctionKind::Upper | FunctionKind::Lower => {
                arity(1)?;
                Ok(LogicalType::Varchar(None))
            }
            FunctionKind::Length => {
                arity(1)?;
                Ok(LogicalType::Integer)
            }
            FunctionKind::Abs => {
                arity(1)?;
                let ty = args[0].return_type();

                if !ty.is_numeric() && ty != LogicalType::SqlNull {
                    return Err(DatabaseError::InvalidType);
                }
                Ok(ty)
            }
            FunctionKind::Coalesce => {
                if args.is_empty() {
                    return Err(DatabaseError::MisMatch(1, 0));
                }
                Ok(args
                    .iter()
                    .map(ScalarExpression::return_type)
                    .find(|ty| *ty != LogicalType::SqlNull)
                    .unwrap_or(LogicalType::SqlNull))
            }
        }
    }

    pub fn eval(&self, args: &[ValueRef], ty: &LogicalType) -> Result<DataValue, DatabaseError> {
        match self {
            FunctionKind::Coalesce => {
                for value in args {
                    if !value.is_null() {
                        return DataValue::clone(value).cast(ty);
                    }
                }
                Ok(DataValue::none(ty))
            }
            kind => {
                let value = args.first().ok_or(DatabaseError::MisMatch(1, 0))?;

                if value.is_null() {
                    return Ok(DataValue::none(ty));
                }
                match kind {
                    FunctionKind::Upper => Ok(DataValue::Utf8(Some(value.to_string().to_uppercase()))),
                    FunctionKind::Lower => Ok(DataValue::Utf8(Some(value.to_string().to_lowercase()))),
                    FunctionKind::Length => {
                        Ok(DataValue::Int32(Some(value.to_string().chars().count() as i32)))
                    }
                    FunctionKind::Abs => match value.as_ref() {
                        DataValue::Int32(v) => Ok(DataValue::Int32(v.map(i32::wrapping_abs))),
                        DataValue::Int64(v) => Ok(DataValue::Int64(v.map(i64::wrapping_abs))),
                        DataValue::Float64(v) => Ok(DataValue::Float64(v.map(f64::abs))),
                        DataValue::Decimal(v) => Ok(DataValue::Decimal(v.map(|v| v.abs()))),
                        _ => Err(DatabaseError::InvalidType),
                    },
                    FunctionKind::Coalesce => unreachable!(),
                }
            }
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FunctionKind::Upper => write!(f, "upper"),
            FunctionKind::Lower => write!(f, "lower"),
            FunctionKind::Length => write!(f, "length"),
            FunctionKind::Abs => write!(f, "abs"),
            FunctionKind::Coalesce => write!(f, "coalesce"),
        }
    }
}
