use crate::errors::DatabaseError;
use crate::expression::{BinaryOperator, UnaryOperator};
use crate::types::value::DataValue;
use crate::types::LogicalType;
use std::cmp::Ordering;

macro_rules! checked_binary_compute {
    ($compute_type:path, $left:expr, $right:expr, $op:expr, $unified_type:expr) => {{
        if let ($compute_type(Some(v1)), $compute_type(Some(v2))) = (
            $left.clone().cast($unified_type)?,
            $right.clone().cast($unified_type)?,
        ) {
            let value = match $op {
                BinaryOperator::Plus => v1.checked_add(v2),
                BinaryOperator::Minus => v1.checked_sub(v2),
                BinaryOperator::Multiply => v1.checked_mul(v2),
                BinaryOperator::Divide => v1.checked_div(v2),
                BinaryOperator::Modulo => v1.checked_rem(v2),
                _ => return Err(DatabaseError::InvalidType),
            };
            $compute_type(Some(value.ok_or_else(|| {
                DatabaseError::InvalidValue(format!("can not compute {} {} {}", v1, $op, v2))
            })?))
        } else {
            DataValue::none($unified_type)
        }
    }};
}

/// Result type of `left op right`, checked when the expression is bound.
pub fn binary_return_type(
    op: &BinaryOperator,
    left: &LogicalType,
    right: &LogicalType,
) -> Result<LogicalType, DatabaseError> {
    if op.is_arithmetic() {
        return match (left, right) {
            (LogicalType::SqlNull, LogicalType::SqlNull) => Ok(LogicalType::SqlNull),
            (LogicalType::SqlNull, ty) | (ty, LogicalType::SqlNull) if ty.is_numeric() => Ok(*ty),
            (left, right) => LogicalType::max_numeric_type(left, right).ok_or(
                DatabaseError::InvalidValue(format!(
                    "binary operator types mismatch: {} {} {}",
                    left, op, right
                )),
            ),
        };
    }
    Ok(match op {
        BinaryOperator::StringConcat => LogicalType::Varchar(None),
        _ => LogicalType::Boolean,
    })
}

impl DataValue {
    pub fn unary_op(&self, op: &UnaryOperator) -> Result<DataValue, DatabaseError> {
        match (op, self) {
            (UnaryOperator::Plus, value) if value.logical_type().is_numeric() => Ok(value.clone()),
            (UnaryOperator::Minus, DataValue::Int32(option)) => {
                Ok(DataValue::Int32(option.map(|v| v.wrapping_neg())))
            }
            (UnaryOperator::Minus, DataValue::Int64(option)) => {
                Ok(DataValue::Int64(option.map(|v| v.wrapping_neg())))
            }
            (UnaryOperator::Minus, DataValue::Float64(option)) => {
                Ok(DataValue::Float64(option.map(|v| -v)))
            }
            (UnaryOperator::Minus, DataValue::Decimal(option)) => {
                Ok(DataValue::Decimal(option.map(|v| -v)))
            }
            (UnaryOperator::Not, DataValue::Boolean(option)) => {
                Ok(DataValue::Boolean(option.map(|v| !v)))
            }
            (_, DataValue::Null) => Ok(DataValue::Null),
            _ => Err(DatabaseError::InvalidType),
        }
    }

    /// Tips:
    /// - Null values operate as null values
    /// - `and`/`or` follow three-valued logic
    pub fn binary_op(
        &self,
        right: &DataValue,
        op: &BinaryOperator,
    ) -> Result<DataValue, DatabaseError> {
        match op {
            BinaryOperator::And | BinaryOperator::Or => {
                let unpack = |value: &DataValue| match value {
                    DataValue::Boolean(option) => Ok(*option),
                    value if value.is_null() => Ok(None),
                    _ => Err(DatabaseError::InvalidType),
                };
                let (left, right) = (unpack(self)?, unpack(right)?);

                let value = if matches!(op, BinaryOperator::And) {
                    match (left, right) {
                        (Some(false), _) | (_, Some(false)) => Some(false),
                        (Some(true), Some(true)) => Some(true),
                        _ => None,
                    }
                } else {
                    match (left, right) {
                        (Some(true), _) | (_, Some(true)) => Some(true),
                        (Some(false), Some(false)) => Some(false),
                        _ => None,
                    }
                };
                Ok(DataValue::Boolean(value))
            }
            BinaryOperator::StringConcat => {
                if self.is_null() || right.is_null() {
                    return Ok(DataValue::Utf8(None));
                }
                Ok(DataValue::Utf8(Some(format!("{}{}", self, right))))
            }
            op if op.is_comparison() => {
                if self.is_null() || right.is_null() {
                    return Ok(DataValue::Boolean(None));
                }
                let ordering = self.compare(right)?;

                Ok(DataValue::Boolean(Some(match op {
                    BinaryOperator::Gt => ordering == Ordering::Greater,
                    BinaryOperator::Lt => ordering == Ordering::Less,
                    BinaryOperator::GtEq => ordering != Ordering::Less,
                    BinaryOperator::LtEq => ordering != Ordering::Greater,
                    BinaryOperator::Eq => ordering == Ordering::Equal,
                    _ => ordering != Ordering::Equal,
                })))
            }
            op => {
                let unified_type =
                    binary_return_type(op, &self.logical_type(), &right.logical_type())?;

                Ok(match &unified_type {
                    LogicalType::Integer => {
                        checked_binary_compute!(DataValue::Int32, self, right, op, &unified_type)
                    }
                    LogicalType::Bigint => {
                        checked_binary_compute!(DataValue::Int64, self, right, op, &unified_type)
                    }
                    LogicalType::Decimal(_, _) => {
                        checked_binary_compute!(DataValue::Decimal, self, right, op, &unified_type)
                    }
                    LogicalType::Double => {
                        if let (DataValue::Float64(Some(v1)), DataValue::Float64(Some(v2))) = (
                            self.clone().cast(&unified_type)?,
                            right.clone().cast(&unified_type)?,
                        ) {
                            DataValue::Float64(Some(match op {
                                BinaryOperator::Plus => v1 + v2,
                                BinaryOperator::Minus => v1 - v2,
                                BinaryOperator::Multiply => v1 * v2,
                                BinaryOperator::Divide => v1 / v2,
                                BinaryOperator::Modulo => v1 % v2,
                                _ => return Err(DatabaseError::InvalidType),
                            }))
                        } else {
                            DataValue::Float64(None)
                        }
                    }
                    LogicalType::SqlNull => DataValue::Null,
                    _ => return Err(DatabaseError::InvalidType),
                })
            }
        }
    }
}
