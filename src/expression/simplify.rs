use crate::errors::DatabaseError;
use crate::expression::{BinaryOperator, ScalarExpression};
use crate::types::tuple::Tuple;
use std::mem;

impl ScalarExpression {
    fn is_constant(&self) -> bool {
        matches!(self, ScalarExpression::Constant(_))
    }

    /// Replaces every sub-expression that reads no column with its value.
    ///
    /// Aggregate calls are never folded, their arguments are.
    pub fn constant_fold(&mut self) -> Result<(), DatabaseError> {
        let foldable = match self {
            ScalarExpression::Constant(_) | ScalarExpression::ColumnRef(_) => return Ok(()),
            ScalarExpression::Alias { expr, .. } => {
                expr.constant_fold()?;
                false
            }
            ScalarExpression::IsNull { expr, .. } | ScalarExpression::Unary { expr, .. } => {
                expr.constant_fold()?;
                expr.is_constant()
            }
            ScalarExpression::Binary {
                left_expr,
                right_expr,
                ..
            } => {
                left_expr.constant_fold()?;
                right_expr.constant_fold()?;
                left_expr.is_constant() && right_expr.is_constant()
            }
            ScalarExpression::AggCall { args, .. } => {
                for expr in args.iter_mut() {
                    expr.constant_fold()?;
                }
                false
            }
            ScalarExpression::Function { args, .. } | ScalarExpression::Tuple(args) => {
                for expr in args.iter_mut() {
                    expr.constant_fold()?;
                }
                args.iter().all(ScalarExpression::is_constant)
            }
        };

        if foldable {
            let value = self.eval(&Tuple::new(None, vec![]), &[])?;
            let _ = mem::replace(self, ScalarExpression::Constant(value));
        }
        Ok(())
    }

    /// Splits a predicate on `and`.
    pub fn conjuncts(&self) -> Vec<&ScalarExpression> {
        match self {
            ScalarExpression::Binary {
                op: BinaryOperator::And,
                left_expr,
                right_expr,
                ..
            } => {
                let mut conjuncts = left_expr.conjuncts();
                conjuncts.append(&mut right_expr.conjuncts());
                conjuncts
            }
            expr => vec![expr],
        }
    }

    /// Expressions a predicate pins to a single non-null value (`expr = constant`).
    pub fn constant_bindings(&self) -> Vec<ScalarExpression> {
        self.conjuncts()
            .into_iter()
            .filter_map(|conjunct| match conjunct {
                ScalarExpression::Binary {
                    op: BinaryOperator::Eq,
                    left_expr,
                    right_expr,
                    ..
                } => match (left_expr.as_ref(), right_expr.as_ref()) {
                    (ScalarExpression::Constant(value), expr)
                    | (expr, ScalarExpression::Constant(value))
                        if !value.is_null() && !expr.is_constant() =>
                    {
                        Some(expr.unpack_alias().clone())
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use crate::catalog::{ColumnCatalog, ColumnDesc};
    use crate::errors::DatabaseError;
    use crate::expression::{BinaryOperator, ScalarExpression};
    use crate::types::value::DataValue;
    use crate::types::LogicalType;
    use std::sync::Arc;

    fn binary(
        op: BinaryOperator,
        left_expr: ScalarExpression,
        right_expr: ScalarExpression,
        ty: LogicalType,
    ) -> ScalarExpression {
        ScalarExpression::Binary {
            op,
            left_expr: Box::new(left_expr),
            right_expr: Box::new(right_expr),
            ty,
        }
    }

    fn constant(value: DataValue) -> ScalarExpression {
        ScalarExpression::Constant(Arc::new(value))
    }

    #[test]
    fn test_constant_fold() -> Result<(), DatabaseError> {
        let k2 = ScalarExpression::ColumnRef(Arc::new(ColumnCatalog::new(
            "k2".to_string(),
            false,
            ColumnDesc::new(LogicalType::Integer, Some(1), false),
        )));
        let one_plus_two = binary(
            BinaryOperator::Plus,
            constant(DataValue::Int32(Some(1))),
            constant(DataValue::Int32(Some(2))),
            LogicalType::Integer,
        );

        let mut folded = one_plus_two.clone();
        folded.constant_fold()?;
        assert_eq!(folded, constant(DataValue::Int32(Some(3))));

        let mut partial = binary(BinaryOperator::Multiply, k2.clone(), one_plus_two, LogicalType::Integer);
        partial.constant_fold()?;
        assert_eq!(
            partial,
            binary(
                BinaryOperator::Multiply,
                k2,
                constant(DataValue::Int32(Some(3))),
                LogicalType::Integer
            )
        );

        Ok(())
    }

    #[test]
    fn test_constant_bindings() {
        let k2 = ScalarExpression::ColumnRef(Arc::new(ColumnCatalog::new(
            "k2".to_string(),
            false,
            ColumnDesc::new(LogicalType::Varchar(None), Some(1), false),
        )));
        let val2 = ScalarExpression::ColumnRef(Arc::new(ColumnCatalog::new(
            "val2".to_string(),
            true,
            ColumnDesc::new(LogicalType::Integer, None, false),
        )));
        let predicate = binary(
            BinaryOperator::And,
            binary(
                BinaryOperator::Eq,
                constant(DataValue::from("ABC")),
                k2.clone(),
                LogicalType::Boolean,
            ),
            binary(
                BinaryOperator::Gt,
                val2.clone(),
                constant(DataValue::Int32(Some(1))),
                LogicalType::Boolean,
            ),
            LogicalType::Boolean,
        );
        assert_eq!(predicate.constant_bindings(), vec![k2]);

        let null_binding = binary(
            BinaryOperator::Eq,
            val2,
            constant(DataValue::Int32(None)),
            LogicalType::Boolean,
        );
        assert!(null_binding.constant_bindings().is_empty());
    }
}
