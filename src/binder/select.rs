use crate::binder::{lower_ident, Binder};
use crate::errors::DatabaseError;
use crate::expression::ScalarExpression;
use crate::parser::Select;
use crate::planner::operator::filter::FilterOperator;
use crate::planner::operator::limit::LimitOperator;
use crate::planner::operator::project::ProjectOperator;
use crate::planner::operator::sort::{SortField, SortOperator};
use crate::planner::operator::table_scan::TableScanOperator;
use crate::planner::operator::Operator;
use crate::planner::{Childrens, LogicalPlan};
use itertools::Itertools;
use sqlparser::ast::{Expr, SelectItem};
use std::mem;

impl<'a> Binder<'a> {
    pub(crate) fn bind_select(&mut self, select: &Select) -> Result<LogicalPlan, DatabaseError> {
        let table = self.context.table;
        if select.table_name() != table.name().as_str() {
            return Err(DatabaseError::TableNotFound(select.table_name().to_string()));
        }
        let mut plan = TableScanOperator::build(table);

        let mut select_list = self.normalize_select_item(&select.projection)?;

        if let Some(predicate) = &select.selection {
            plan = self.bind_where(plan, predicate)?;
        }

        let mut sort_fields = self.bind_order_by(select.order_by(), &select_list)?;
        let groupby_exprs = self.bind_group_by(&select.group_by, &select_list)?;
        let agg_calls = mem::take(&mut self.context.agg_calls);

        if select.distinct {
            if !agg_calls.is_empty() || !groupby_exprs.is_empty() {
                return Err(DatabaseError::UnsupportedStmt(
                    "DISTINCT combined with GROUP BY or aggregate functions".to_string(),
                ));
            }
            let distinct_exprs = select_list
                .iter()
                .map(|expr| expr.unpack_alias().clone())
                .unique()
                .collect_vec();

            plan = self.bind_aggregate(plan, vec![], distinct_exprs.clone(), true);
            (select_list, sort_fields) =
                Self::rewrite_above_aggregate(select_list, sort_fields, &[], &distinct_exprs)?;
        } else if !agg_calls.is_empty() || !groupby_exprs.is_empty() {
            plan = self.bind_aggregate(plan, agg_calls.clone(), groupby_exprs.clone(), false);
            (select_list, sort_fields) =
                Self::rewrite_above_aggregate(select_list, sort_fields, &agg_calls, &groupby_exprs)?;
        }

        for expr in select_list.iter_mut() {
            expr.constant_fold()?;
        }
        for field in sort_fields.iter_mut() {
            field.expr.constant_fold()?;
        }

        if !sort_fields.is_empty() {
            plan = LogicalPlan::new(
                Operator::Sort(SortOperator {
                    sort_fields,
                    limit: None,
                }),
                Childrens::Only(plan),
            );
        }
        plan = ProjectOperator::build(select_list, plan);

        if select.limit.is_some() || select.offset.is_some() {
            plan = LimitOperator::build(select.offset, select.limit, plan);
        }

        Ok(plan)
    }

    fn normalize_select_item(
        &mut self,
        items: &[SelectItem],
    ) -> Result<Vec<ScalarExpression>, DatabaseError> {
        let table = self.context.table;
        let all_columns = || {
            table
                .columns()
                .map(|column| ScalarExpression::ColumnRef(column.clone()))
                .collect_vec()
        };
        if items.is_empty() {
            return Ok(all_columns());
        }
        let mut select_items = vec![];

        for item in items.iter() {
            match item {
                SelectItem::UnnamedExpr(expr) => select_items.push(self.bind_expr(expr)?),
                SelectItem::ExprWithAlias { expr, alias } => {
                    let expr = self.bind_expr(expr)?;

                    select_items.push(ScalarExpression::Alias {
                        expr: Box::new(expr),
                        alias: lower_ident(alias),
                    });
                }
                SelectItem::Wildcard(_) => select_items.append(&mut all_columns()),
                SelectItem::QualifiedWildcard(table_name, _) => {
                    let matched = table_name
                        .0
                        .last()
                        .map(|ident| lower_ident(ident) == table.name().as_str())
                        .unwrap_or(false);
                    if !matched {
                        return Err(DatabaseError::TableNotFound(table_name.to_string()));
                    }
                    select_items.append(&mut all_columns());
                }
            }
        }

        Ok(select_items)
    }

    fn bind_where(
        &mut self,
        children: LogicalPlan,
        predicate: &Expr,
    ) -> Result<LogicalPlan, DatabaseError> {
        self.context.allow_agg = false;
        let predicate = self.bind_expr(predicate);
        self.context.allow_agg = true;

        let mut predicate = predicate?;
        predicate.constant_fold()?;

        Ok(FilterOperator::build(predicate, children))
    }

    /// GROUP BY items may name a select-list alias.
    fn bind_group_by(
        &mut self,
        group_by: &[Expr],
        select_list: &[ScalarExpression],
    ) -> Result<Vec<ScalarExpression>, DatabaseError> {
        self.context.allow_agg = false;
        let groupby_exprs = group_by
            .iter()
            .map(|expr| {
                if let Expr::Identifier(ident) = expr {
                    let name = lower_ident(ident);

                    if let Some(ScalarExpression::Alias { expr, .. }) = select_list.iter().find(
                        |item| matches!(item, ScalarExpression::Alias { alias, .. } if *alias == name),
                    ) {
                        return Ok(expr.unpack_alias().clone());
                    }
                }
                self.bind_expr(expr)
            })
            .collect::<Result<Vec<_>, _>>();
        self.context.allow_agg = true;

        Ok(groupby_exprs?.into_iter().unique().collect_vec())
    }

    fn rewrite_above_aggregate(
        select_list: Vec<ScalarExpression>,
        sort_fields: Vec<SortField>,
        agg_calls: &[ScalarExpression],
        groupby_exprs: &[ScalarExpression],
    ) -> Result<(Vec<ScalarExpression>, Vec<SortField>), DatabaseError> {
        let select_list = select_list
            .into_iter()
            .map(|expr| Self::rewrite_onto_aggregate(expr, agg_calls, groupby_exprs))
            .try_collect()?;
        let sort_fields = sort_fields
            .into_iter()
            .map(|mut field| {
                field.expr = Self::rewrite_onto_aggregate(field.expr, agg_calls, groupby_exprs)?;
                Ok::<_, DatabaseError>(field)
            })
            .try_collect()?;

        Ok((select_list, sort_fields))
    }
}

#[cfg(test)]
mod test {
    use crate::binder::test::bind_t1;
    use crate::errors::DatabaseError;
    use crate::parser::SelectBuilder;

    #[test]
    fn test_select_plan_shape() -> Result<(), DatabaseError> {
        let plan = bind_t1(
            &SelectBuilder::from("t1")
                .columns("k1, val1")?
                .filter("k2 = 'ABC' and 1 = 1")?
                .order_by("val1")?
                .limit(2)
                .offset(1)
                .build(),
        )?;

        assert_eq!(
            plan.to_string(),
            "Limit 2, Offset 1\n  \
             Projection [t1.k1, t1.val1]\n    \
             Sort By t1.val1 Asc Nulls Last\n      \
             Filter ((t1.k2 = 'ABC') and true)\n        \
             TableScan t1 -> [k1, k2, val1, val2, col4]"
        );

        Ok(())
    }

    #[test]
    fn test_select_distinct() -> Result<(), DatabaseError> {
        let plan = bind_t1(
            &SelectBuilder::from("t1")
                .columns("k2, val1, val2")?
                .distinct()
                .order_by("val1")?
                .build(),
        )?;
        assert_eq!(
            plan.to_string(),
            "Projection [t1.k2, t1.val1, t1.val2]\n  \
             Sort By t1.val1 Asc Nulls Last\n    \
             Aggregate [] -> Group By [t1.k2, t1.val1, t1.val2]\n      \
             TableScan t1 -> [k1, k2, val1, val2, col4]"
        );

        assert!(matches!(
            bind_t1(
                &SelectBuilder::from("t1")
                    .columns("k2")?
                    .distinct()
                    .order_by("val1")?
                    .build()
            ),
            Err(DatabaseError::UnresolvedExpression(_))
        ));
        assert!(matches!(
            bind_t1(
                &SelectBuilder::from("t1")
                    .columns("count(k2)")?
                    .distinct()
                    .build()
            ),
            Err(DatabaseError::UnsupportedStmt(_))
        ));
        assert!(matches!(
            bind_t1(&SelectBuilder::from("t1").filter("count(k1) > 1")?.build()),
            Err(DatabaseError::UnsupportedStmt(_))
        ));
        assert!(matches!(
            bind_t1(&SelectBuilder::from("t2").build()),
            Err(DatabaseError::TableNotFound(_))
        ));

        Ok(())
    }
}
