use crate::binder::{lower_ident, Binder};
use crate::errors::DatabaseError;
use crate::expression::ScalarExpression;
use crate::planner::operator::sort::{default_nulls_first, OrderSource, SortField};
use sqlparser::ast::{Expr, OrderByExpr, UnaryOperator, Value};

impl<'a> Binder<'a> {
    /// Resolves ORDER BY items against the select list.
    ///
    /// An item is tried as a select-list position, then as an alias, then as
    /// an expression over the table. Row value constructors expand into one
    /// key per element, each inheriting the item's direction.
    pub(crate) fn bind_order_by(
        &mut self,
        order_by: &[OrderByExpr],
        select_list: &[ScalarExpression],
    ) -> Result<Vec<SortField>, DatabaseError> {
        let mut sort_fields = Vec::with_capacity(order_by.len());

        for OrderByExpr {
            expr,
            asc,
            nulls_first,
        } in order_by
        {
            let asc = asc.unwrap_or(true);
            let nulls_first = nulls_first.unwrap_or(default_nulls_first(asc));

            self.expand_order_item(expr, asc, nulls_first, select_list, &mut sort_fields)?;
        }

        Ok(sort_fields)
    }

    fn expand_order_item(
        &mut self,
        expr: &Expr,
        asc: bool,
        nulls_first: bool,
        select_list: &[ScalarExpression],
        sort_fields: &mut Vec<SortField>,
    ) -> Result<(), DatabaseError> {
        match expr {
            Expr::Tuple(exprs) => {
                for expr in exprs {
                    self.expand_order_item(expr, asc, nulls_first, select_list, sort_fields)?;
                }
            }
            Expr::Nested(inner) if matches!(inner.as_ref(), Expr::Tuple(_) | Expr::Nested(_)) => {
                self.expand_order_item(inner, asc, nulls_first, select_list, sort_fields)?;
            }
            expr => {
                let (expr, source) = self.bind_order_item(expr, select_list)?;

                sort_fields.push(SortField::new(expr, asc, nulls_first).with_source(source));
            }
        }

        Ok(())
    }

    fn bind_order_item(
        &mut self,
        expr: &Expr,
        select_list: &[ScalarExpression],
    ) -> Result<(ScalarExpression, OrderSource), DatabaseError> {
        let invalid_ordinal = |ordinal: String| DatabaseError::InvalidOrdinal {
            ordinal,
            len: select_list.len(),
        };

        match expr {
            Expr::Value(Value::Number(n, _)) if is_integer_literal(n) => {
                let position = n
                    .parse::<usize>()
                    .ok()
                    .filter(|position| (1..=select_list.len()).contains(position))
                    .ok_or_else(|| invalid_ordinal(n.clone()))?;

                Ok((
                    select_list[position - 1].unpack_alias().clone(),
                    OrderSource::Position,
                ))
            }
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } if matches!(expr.as_ref(), Expr::Value(Value::Number(n, _)) if is_integer_literal(n)) => {
                Err(invalid_ordinal(format!("-{}", expr)))
            }
            Expr::Identifier(ident) => {
                let name = lower_ident(ident);
                let aliased = select_list.iter().find_map(|item| match item {
                    ScalarExpression::Alias { expr, alias } if *alias == name => Some(expr),
                    _ => None,
                });

                match aliased {
                    Some(expr) => Ok((expr.unpack_alias().clone(), OrderSource::Alias)),
                    None => self.bind_order_expr(expr),
                }
            }
            expr => self.bind_order_expr(expr),
        }
    }

    fn bind_order_expr(
        &mut self,
        expr: &Expr,
    ) -> Result<(ScalarExpression, OrderSource), DatabaseError> {
        match self.bind_expr(expr) {
            Ok(expr) => Ok((expr, OrderSource::Expression)),
            Err(DatabaseError::InvalidColumn(name)) => Err(DatabaseError::UnresolvedExpression(
                format!("ORDER BY item {} references unknown column {}", expr, name),
            )),
            Err(err) => Err(err),
        }
    }
}

fn is_integer_literal(n: &str) -> bool {
    !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod test {
    use crate::binder::test::bind_t1;
    use crate::errors::DatabaseError;
    use crate::expression::ScalarExpression;
    use crate::parser::SelectBuilder;
    use crate::planner::operator::sort::{OrderSource, SortField};
    use crate::planner::operator::Operator;
    use crate::planner::LogicalPlan;

    fn sort_fields(plan: &LogicalPlan) -> Vec<SortField> {
        let mut plan = Some(plan);

        while let Some(node) = plan {
            if let Operator::Sort(op) = node.operator() {
                return op.sort_fields.clone();
            }
            plan = node.child();
        }
        vec![]
    }

    #[test]
    fn test_order_by_position_and_alias() -> Result<(), DatabaseError> {
        let plan = bind_t1(
            &SelectBuilder::from("t1")
                .columns("val1 + val2 AS total, col4")?
                .order_by("1, 2 DESC, total NULLS FIRST")?
                .build(),
        )?;
        let fields = sort_fields(&plan);

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].to_string(), "(t1.val1 + t1.val2) Asc Nulls Last");
        assert_eq!(fields[0].source, OrderSource::Position);
        assert_eq!(fields[1].to_string(), "t1.col4 Desc Nulls First");
        assert_eq!(fields[2].expr, fields[0].expr);
        assert_eq!(fields[2].source, OrderSource::Alias);
        assert!(fields[2].nulls_first);

        Ok(())
    }

    #[test]
    fn test_order_by_row_value_constructor() -> Result<(), DatabaseError> {
        let plan = bind_t1(
            &SelectBuilder::from("t1")
                .order_by("(val1, (val2, k1)) DESC, k2")?
                .build(),
        )?;
        let fields = sort_fields(&plan);

        assert_eq!(
            fields.iter().map(|field| field.to_string()).collect::<Vec<_>>(),
            vec![
                "t1.val1 Desc Nulls First",
                "t1.val2 Desc Nulls First",
                "t1.k1 Desc Nulls First",
                "t1.k2 Asc Nulls Last",
            ]
        );

        Ok(())
    }

    #[test]
    fn test_order_by_invalid_position() -> Result<(), DatabaseError> {
        for order_by in ["0", "3", "-1"] {
            let result = bind_t1(
                &SelectBuilder::from("t1")
                    .columns("k1, k2")?
                    .order_by(order_by)?
                    .build(),
            );
            match result {
                Err(DatabaseError::InvalidOrdinal { ordinal, len }) => {
                    assert_eq!(ordinal, order_by);
                    assert_eq!(len, 2);
                }
                other => panic!("unexpected: {:?}", other),
            }
        }

        Ok(())
    }

    #[test]
    fn test_order_by_constant_folded() -> Result<(), DatabaseError> {
        let plan = bind_t1(
            &SelectBuilder::from("t1")
                .columns("k1")?
                .order_by("1 + 1, k1")?
                .build(),
        )?;
        let fields = sort_fields(&plan);

        assert!(matches!(fields[0].expr, ScalarExpression::Constant(_)));
        assert!(matches!(
            bind_t1(
                &SelectBuilder::from("t1")
                    .columns("k1")?
                    .order_by("missing")?
                    .build()
            ),
            Err(DatabaseError::UnresolvedExpression(_))
        ));

        Ok(())
    }
}
