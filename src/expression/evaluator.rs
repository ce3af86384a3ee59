use crate::catalog::ColumnRef;
use crate::errors::DatabaseError;
use crate::expression::ScalarExpression;
use crate::types::tuple::Tuple;
use crate::types::value::{DataValue, ValueRef};
use std::sync::Arc;

impl ScalarExpression {
    pub fn eval(&self, tuple: &Tuple, schema: &[ColumnRef]) -> Result<ValueRef, DatabaseError> {
        let eval_column = |column: &ColumnRef| -> Result<Option<ValueRef>, DatabaseError> {
            let Some(index) = schema.iter().position(|tul_col| tul_col == column) else {
                return Ok(None);
            };
            tuple
                .values
                .get(index)
                .cloned()
                .map(Some)
                .ok_or(DatabaseError::MisMatch(schema.len(), tuple.values.len()))
        };

        match self {
            ScalarExpression::Constant(val) => Ok(val.clone()),
            ScalarExpression::ColumnRef(col) => {
                eval_column(col)?.ok_or_else(|| DatabaseError::InvalidColumn(col.full_name()))
            }
            ScalarExpression::Alias { expr, .. } => expr.eval(tuple, schema),
            ScalarExpression::IsNull { negated, expr } => {
                let value = expr.eval(tuple, schema)?;

                Ok(Arc::new(DataValue::Boolean(Some(value.is_null() != *negated))))
            }
            ScalarExpression::Unary { expr, op, .. } => {
                let value = expr.eval(tuple, schema)?;

                Ok(Arc::new(value.unary_op(op)?))
            }
            ScalarExpression::Binary {
                left_expr,
                right_expr,
                op,
                ..
            } => {
                let left = left_expr.eval(tuple, schema)?;
                let right = right_expr.eval(tuple, schema)?;

                Ok(Arc::new(left.binary_op(&right, op)?))
            }
            ScalarExpression::AggCall { .. } => eval_column(&self.output_column())?
                .ok_or_else(|| DatabaseError::AggMiss(self.to_string())),
            ScalarExpression::Function { kind, args, ty } => {
                let values = args
                    .iter()
                    .map(|expr| expr.eval(tuple, schema))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Arc::new(kind.eval(&values, ty)?))
            }
            ScalarExpression::Tuple(exprs) => {
                let values = exprs
                    .iter()
                    .map(|expr| expr.eval(tuple, schema))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Arc::new(DataValue::Tuple(Some(values))))
            }
        }
    }
}
