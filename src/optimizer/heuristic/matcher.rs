use crate::optimizer::core::pattern::{Pattern, PatternChildrenPredicate};
use crate::planner::LogicalPlan;

/// Use pattern to determines which rule can be applied
pub struct PlanMatcher<'a, 'b> {
    pattern: &'a Pattern,
    plan: &'b LogicalPlan,
}

impl<'a, 'b> PlanMatcher<'a, 'b> {
    pub(crate) fn new(pattern: &'a Pattern, plan: &'b LogicalPlan) -> Self {
        Self { pattern, plan }
    }

    pub(crate) fn match_opt_expr(&self) -> bool {
        // check the root node predicate
        if !(self.pattern.predicate)(self.plan.operator()) {
            return false;
        }

        match &self.pattern.children {
            PatternChildrenPredicate::Predicate(patterns) => {
                let mut childrens = self.plan.childrens.iter();

                for pattern in patterns {
                    match childrens.next() {
                        Some(child) if PlanMatcher::new(pattern, child).match_opt_expr() => (),
                        _ => return false,
                    }
                }
            }
            PatternChildrenPredicate::None => (),
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use crate::binder::test::bind_t1;
    use crate::errors::DatabaseError;
    use crate::optimizer::core::pattern::{Pattern, PatternChildrenPredicate};
    use crate::optimizer::heuristic::matcher::PlanMatcher;
    use crate::parser::SelectBuilder;
    use crate::planner::operator::Operator;

    #[test]
    fn test_predicate() -> Result<(), DatabaseError> {
        let plan = bind_t1(&SelectBuilder::from("t1").order_by("val1")?.build())?;

        let project_over_sort = Pattern {
            predicate: |op| matches!(op, Operator::Project(_)),
            children: PatternChildrenPredicate::Predicate(vec![Pattern {
                predicate: |op| matches!(op, Operator::Sort(_)),
                children: PatternChildrenPredicate::None,
            }]),
        };
        let project_over_scan = Pattern {
            predicate: |op| matches!(op, Operator::Project(_)),
            children: PatternChildrenPredicate::Predicate(vec![Pattern {
                predicate: |op| matches!(op, Operator::TableScan(_)),
                children: PatternChildrenPredicate::None,
            }]),
        };
        let scan_over_anything = Pattern {
            predicate: |op| matches!(op, Operator::TableScan(_)),
            children: PatternChildrenPredicate::Predicate(vec![Pattern {
                predicate: |_| true,
                children: PatternChildrenPredicate::None,
            }]),
        };

        assert!(PlanMatcher::new(&project_over_sort, &plan).match_opt_expr());
        assert!(!PlanMatcher::new(&project_over_scan, &plan).match_opt_expr());

        let mut leaf = &plan;
        while let Some(child) = leaf.child() {
            leaf = child;
        }
        assert!(!PlanMatcher::new(&scan_over_anything, leaf).match_opt_expr());

        Ok(())
    }
}
