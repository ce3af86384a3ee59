use crate::binder::{lower_ident, Binder};
use crate::errors::DatabaseError;
use crate::expression::agg::AggKind;
use crate::expression::function::FunctionKind;
use crate::expression::value_compute::binary_return_type;
use crate::expression::{BinaryOperator, ScalarExpression, UnaryOperator};
use crate::types::value::DataValue;
use crate::types::LogicalType;
use itertools::Itertools;
use sqlparser::ast::{
    BinaryOperator as SqlBinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr, Ident,
    UnaryOperator as SqlUnaryOperator,
};
use std::slice;
use std::sync::Arc;

impl<'a> Binder<'a> {
    pub(crate) fn bind_expr(&mut self, expr: &Expr) -> Result<ScalarExpression, DatabaseError> {
        match expr {
            Expr::Identifier(ident) => self.bind_column_ref_from_identifiers(slice::from_ref(ident)),
            Expr::CompoundIdentifier(idents) => self.bind_column_ref_from_identifiers(idents),
            Expr::BinaryOp { left, right, op } => self.bind_binary_op_internal(left, right, op),
            Expr::Value(v) => Ok(ScalarExpression::Constant(Arc::new(DataValue::try_from(v)?))),
            Expr::Function(func) => self.bind_function(func),
            Expr::Nested(expr) => self.bind_expr(expr),
            Expr::UnaryOp { expr, op } => self.bind_unary_op_internal(expr, op),
            Expr::IsNull(expr) => self.bind_is_null(expr, false),
            Expr::IsNotNull(expr) => self.bind_is_null(expr, true),
            Expr::InList {
                expr,
                list,
                negated,
            } => self.bind_in_list(expr, list, *negated),
            Expr::Tuple(exprs) => Ok(ScalarExpression::Tuple(
                exprs
                    .iter()
                    .map(|expr| self.bind_expr(expr))
                    .try_collect()?,
            )),
            expr => Err(DatabaseError::UnsupportedStmt(expr.to_string())),
        }
    }

    fn bind_column_ref_from_identifiers(
        &mut self,
        idents: &[Ident],
    ) -> Result<ScalarExpression, DatabaseError> {
        let full_name = || idents.iter().map(|ident| ident.value.as_str()).join(".");
        let (table_name, column_name) = match idents {
            [column] => (None, lower_ident(column)),
            [table, column] => (Some(lower_ident(table)), lower_ident(column)),
            _ => return Err(DatabaseError::InvalidColumn(full_name())),
        };

        if let Some(table_name) = table_name {
            if table_name.as_str() != self.context.table.name().as_str() {
                return Err(DatabaseError::InvalidColumn(full_name()));
            }
        }
        let column = self
            .context
            .table
            .get_column_by_name(&column_name)
            .ok_or_else(|| DatabaseError::InvalidColumn(full_name()))?;

        Ok(ScalarExpression::ColumnRef(column.clone()))
    }

    fn bind_binary_op_internal(
        &mut self,
        left: &Expr,
        right: &Expr,
        op: &SqlBinaryOperator,
    ) -> Result<ScalarExpression, DatabaseError> {
        let op = BinaryOperator::try_from(op.clone())?;
        let mut left_expr = self.bind_expr(left)?;
        let mut right_expr = self.bind_expr(right)?;

        if op.is_comparison() {
            Self::coerce_literal(&mut left_expr, &right_expr.return_type())?;
            Self::coerce_literal(&mut right_expr, &left_expr.return_type())?;
        }
        let ty = binary_return_type(&op, &left_expr.return_type(), &right_expr.return_type())?;

        Ok(ScalarExpression::Binary {
            op,
            left_expr: Box::new(left_expr),
            right_expr: Box::new(right_expr),
            ty,
        })
    }

    /// `date_col = '2023-01-01'` compares dates, not text.
    fn coerce_literal(expr: &mut ScalarExpression, target: &LogicalType) -> Result<(), DatabaseError> {
        if let ScalarExpression::Constant(value) = expr {
            if matches!(value.as_ref(), DataValue::Utf8(Some(_))) && target.is_temporal() {
                let casted = DataValue::clone(value).cast(target)?;
                *expr = ScalarExpression::Constant(Arc::new(casted));
            }
        }
        Ok(())
    }

    fn bind_unary_op_internal(
        &mut self,
        expr: &Expr,
        op: &SqlUnaryOperator,
    ) -> Result<ScalarExpression, DatabaseError> {
        let op = UnaryOperator::try_from(op.clone())?;
        let expr = self.bind_expr(expr)?;
        let ty = if let UnaryOperator::Not = op {
            LogicalType::Boolean
        } else {
            expr.return_type()
        };

        Ok(ScalarExpression::Unary {
            op,
            expr: Box::new(expr),
            ty,
        })
    }

    fn bind_is_null(&mut self, expr: &Expr, negated: bool) -> Result<ScalarExpression, DatabaseError> {
        Ok(ScalarExpression::IsNull {
            negated,
            expr: Box::new(self.bind_expr(expr)?),
        })
    }

    /// `x IN (a, b)` becomes `x = a or x = b`.
    fn bind_in_list(
        &mut self,
        expr: &Expr,
        list: &[Expr],
        negated: bool,
    ) -> Result<ScalarExpression, DatabaseError> {
        let (compare_op, fold_op) = if negated {
            (BinaryOperator::NotEq, BinaryOperator::And)
        } else {
            (BinaryOperator::Eq, BinaryOperator::Or)
        };
        let left_expr = self.bind_expr(expr)?;
        let mut predicate: Option<ScalarExpression> = None;

        for item in list {
            let mut right_expr = self.bind_expr(item)?;
            Self::coerce_literal(&mut right_expr, &left_expr.return_type())?;

            let compare = ScalarExpression::Binary {
                op: compare_op,
                left_expr: Box::new(left_expr.clone()),
                right_expr: Box::new(right_expr),
                ty: LogicalType::Boolean,
            };
            predicate = Some(match predicate.take() {
                Some(left) => ScalarExpression::Binary {
                    op: fold_op,
                    left_expr: Box::new(left),
                    right_expr: Box::new(compare),
                    ty: LogicalType::Boolean,
                },
                None => compare,
            });
        }

        predicate.ok_or_else(|| DatabaseError::UnsupportedStmt(format!("empty IN list on {}", expr)))
    }

    fn bind_function(&mut self, func: &Function) -> Result<ScalarExpression, DatabaseError> {
        let name = func
            .name
            .0
            .last()
            .map(lower_ident)
            .ok_or_else(|| DatabaseError::UnsupportedStmt(func.to_string()))?;

        let mut args = Vec::with_capacity(func.args.len());
        let mut wildcard = false;
        for arg in func.args.iter() {
            let arg_expr = match arg {
                FunctionArg::Named { arg, .. } => arg,
                FunctionArg::Unnamed(arg) => arg,
            };
            match arg_expr {
                FunctionArgExpr::Expr(expr) => args.push(self.bind_expr(expr)?),
                FunctionArgExpr::Wildcard => wildcard = true,
                FunctionArgExpr::QualifiedWildcard(_) => {
                    return Err(DatabaseError::UnsupportedStmt(func.to_string()))
                }
            }
        }

        if let Some(kind) = AggKind::from_name(&name) {
            return self.bind_agg_call(func, kind, args, wildcard);
        }
        if wildcard {
            return Err(DatabaseError::UnsupportedStmt(func.to_string()));
        }
        let kind = FunctionKind::from_name(&name)
            .ok_or_else(|| DatabaseError::UnsupportedStmt(format!("function {}", name)))?;
        let ty = kind.return_type(&args)?;

        Ok(ScalarExpression::Function { kind, args, ty })
    }

    fn bind_agg_call(
        &mut self,
        func: &Function,
        kind: AggKind,
        args: Vec<ScalarExpression>,
        wildcard: bool,
    ) -> Result<ScalarExpression, DatabaseError> {
        if !self.context.allow_agg || args.iter().any(ScalarExpression::has_agg_call) {
            return Err(DatabaseError::UnsupportedStmt(format!(
                "aggregate function is not allowed here: {}",
                func
            )));
        }
        let ty = match (kind, args.as_slice(), wildcard) {
            (AggKind::Count, [], true) => kind.return_type(&LogicalType::SqlNull)?,
            (_, [arg], false) => kind.return_type(&arg.return_type())?,
            _ => return Err(DatabaseError::MisMatch(1, args.len())),
        };
        let expr = ScalarExpression::AggCall {
            distinct: func.distinct,
            kind,
            args,
            ty,
        };
        if !self.context.agg_calls.contains(&expr) {
            self.context.agg_calls.push(expr.clone());
        }

        Ok(expr)
    }
}

#[cfg(test)]
mod test {
    use crate::binder::test::build_t1;
    use crate::binder::{Binder, BinderContext};
    use crate::errors::DatabaseError;
    use crate::expression::{BinaryOperator, ScalarExpression};
    use crate::parser::rs_parser::RSParser;
    use crate::types::LogicalType;

    #[test]
    fn test_bind_expr() -> Result<(), DatabaseError> {
        let table = build_t1()?;
        let mut binder = Binder::new(BinderContext::new(&table));

        let expr = binder.bind_expr(&RSParser::new("VAL1 + t1.col4")?.parse_expr()?)?;
        assert_eq!(expr.to_string(), "(t1.val1 + t1.col4)");
        assert_eq!(expr.return_type(), LogicalType::Bigint);

        let expr = binder.bind_expr(&RSParser::new("k2 in ('a', 'b')")?.parse_expr()?)?;
        assert!(matches!(
            expr,
            ScalarExpression::Binary {
                op: BinaryOperator::Or,
                ..
            }
        ));

        let expr = binder.bind_expr(&RSParser::new("count(*)")?.parse_expr()?)?;
        assert_eq!(expr.to_string(), "count(*)");
        assert_eq!(binder.context.agg_calls.len(), 1);
        binder.bind_expr(&RSParser::new("COUNT(*) + 1")?.parse_expr()?)?;
        assert_eq!(binder.context.agg_calls.len(), 1);

        assert!(matches!(
            binder.bind_expr(&RSParser::new("nope + 1")?.parse_expr()?),
            Err(DatabaseError::InvalidColumn(_))
        ));
        assert!(matches!(
            binder.bind_expr(&RSParser::new("other.k1")?.parse_expr()?),
            Err(DatabaseError::InvalidColumn(_))
        ));
        assert!(matches!(
            binder.bind_expr(&RSParser::new("sum(max(val1))")?.parse_expr()?),
            Err(DatabaseError::UnsupportedStmt(_))
        ));

        Ok(())
    }
}
