use crate::binder::Binder;
use crate::errors::DatabaseError;
use crate::expression::ScalarExpression;
use crate::planner::operator::aggregate::AggregateOperator;
use crate::planner::LogicalPlan;
use itertools::Itertools;

impl<'a> Binder<'a> {
    pub(crate) fn bind_aggregate(
        &mut self,
        children: LogicalPlan,
        agg_calls: Vec<ScalarExpression>,
        groupby_exprs: Vec<ScalarExpression>,
        is_distinct: bool,
    ) -> LogicalPlan {
        AggregateOperator::build(children, agg_calls, groupby_exprs, is_distinct)
    }

    /// Rewrites an expression evaluated above the aggregate so it only reads
    /// the aggregate's output columns.
    pub(crate) fn rewrite_onto_aggregate(
        expr: ScalarExpression,
        agg_calls: &[ScalarExpression],
        groupby_exprs: &[ScalarExpression],
    ) -> Result<ScalarExpression, DatabaseError> {
        if agg_calls.contains(&expr) || groupby_exprs.contains(&expr) {
            return Ok(ScalarExpression::ColumnRef(expr.output_column()));
        }
        let rewrite = |expr: Box<ScalarExpression>| {
            Self::rewrite_onto_aggregate(*expr, agg_calls, groupby_exprs).map(Box::new)
        };

        Ok(match expr {
            ScalarExpression::Constant(_) => expr,
            ScalarExpression::ColumnRef(column) => {
                return Err(DatabaseError::UnresolvedExpression(format!(
                    "column {} must appear in the GROUP BY clause or be used in an aggregate function",
                    column.full_name()
                )))
            }
            ScalarExpression::AggCall { .. } => {
                return Err(DatabaseError::AggMiss(expr.to_string()))
            }
            ScalarExpression::Alias { expr, alias } => ScalarExpression::Alias {
                expr: rewrite(expr)?,
                alias,
            },
            ScalarExpression::IsNull { negated, expr } => ScalarExpression::IsNull {
                negated,
                expr: rewrite(expr)?,
            },
            ScalarExpression::Unary { op, expr, ty } => ScalarExpression::Unary {
                op,
                expr: rewrite(expr)?,
                ty,
            },
            ScalarExpression::Binary {
                op,
                left_expr,
                right_expr,
                ty,
            } => ScalarExpression::Binary {
                op,
                left_expr: rewrite(left_expr)?,
                right_expr: rewrite(right_expr)?,
                ty,
            },
            ScalarExpression::Function { kind, args, ty } => ScalarExpression::Function {
                kind,
                args: args
                    .into_iter()
                    .map(|arg| Self::rewrite_onto_aggregate(arg, agg_calls, groupby_exprs))
                    .try_collect()?,
                ty,
            },
            ScalarExpression::Tuple(args) => ScalarExpression::Tuple(
                args.into_iter()
                    .map(|arg| Self::rewrite_onto_aggregate(arg, agg_calls, groupby_exprs))
                    .try_collect()?,
            ),
        })
    }
}

#[cfg(test)]
mod test {
    use crate::binder::test::bind_t1;
    use crate::errors::DatabaseError;
    use crate::parser::SelectBuilder;
    use crate::planner::operator::Operator;

    #[test]
    fn test_bind_aggregate() -> Result<(), DatabaseError> {
        let plan = bind_t1(
            &SelectBuilder::from("t1")
                .columns("k2, count(*) + 1 AS c")?
                .group_by("k2")?
                .build(),
        )?;
        let Operator::Project(project) = plan.operator() else {
            unreachable!()
        };
        assert_eq!(project.exprs[0].to_string(), "t1.k2");
        assert_eq!(project.exprs[1].to_string(), "c");
        assert_eq!(
            plan.output_schema()[1].name,
            "c",
        );
        assert!(plan.contains(|op| matches!(op, Operator::Aggregate(_))));

        assert!(matches!(
            bind_t1(
                &SelectBuilder::from("t1")
                    .columns("k1, count(*)")?
                    .group_by("k2")?
                    .build()
            ),
            Err(DatabaseError::UnresolvedExpression(_))
        ));

        Ok(())
    }
}
