use crate::errors::DatabaseError;
use crate::optimizer::core::ordering::Ordering;
use crate::optimizer::core::pattern::{Pattern, PatternChildrenPredicate};
use crate::optimizer::core::rule::{MatchPattern, NormalizationRule};
use crate::planner::operator::limit::LimitOperator;
use crate::planner::operator::Operator;
use crate::planner::LogicalPlan;
use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    static ref ELIMINATE_REDUNDANT_SORT_RULE: Pattern = {
        Pattern {
            predicate: |op| matches!(op, Operator::Sort(_)),
            children: PatternChildrenPredicate::None,
        }
    };
}

/// Removes a sort whose input already arrives in the requested order.
///
/// A sort carrying a pushed down limit is replaced by that limit.
pub struct EliminateRedundantSort;

impl MatchPattern for EliminateRedundantSort {
    fn pattern(&self) -> &Pattern {
        &ELIMINATE_REDUNDANT_SORT_RULE
    }
}

impl NormalizationRule for EliminateRedundantSort {
    fn apply(&self, plan: &mut LogicalPlan) -> Result<bool, DatabaseError> {
        let Operator::Sort(sort_op) = &plan.operator else {
            return Ok(false);
        };
        let Some(child) = plan.child() else {
            return Ok(false);
        };
        if !Ordering::of(child).satisfies(&sort_op.sort_fields) {
            return Ok(false);
        }
        debug!("[Optimizer]: `{}` is redundant, input is already ordered", sort_op);
        let limit = sort_op.limit;

        match limit {
            Some(limit) => {
                plan.operator = Operator::Limit(LimitOperator::new(None, Some(limit)));
            }
            None => {
                if let Some(child) = plan.take_child() {
                    *plan = child;
                }
            }
        }

        Ok(true)
    }
}
