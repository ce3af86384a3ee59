use crate::errors::DatabaseError;
use crate::optimizer::core::pattern::{Pattern, PatternChildrenPredicate};
use crate::optimizer::core::rule::{MatchPattern, NormalizationRule};
use crate::planner::operator::Operator;
use crate::planner::LogicalPlan;
use lazy_static::lazy_static;

lazy_static! {
    static ref PUSH_LIMIT_INTO_SORT_RULE: Pattern = {
        Pattern {
            predicate: |op| matches!(op, Operator::Limit(_)),
            children: PatternChildrenPredicate::Predicate(vec![Pattern {
                predicate: |op| matches!(op, Operator::Project(_)),
                children: PatternChildrenPredicate::Predicate(vec![Pattern {
                    predicate: |op| matches!(op, Operator::Sort(_)),
                    children: PatternChildrenPredicate::None,
                }]),
            }]),
        }
    };
}

/// Lets the sort below a projection stop after `limit + offset` rows.
pub struct PushLimitIntoSort;

impl MatchPattern for PushLimitIntoSort {
    fn pattern(&self) -> &Pattern {
        &PUSH_LIMIT_INTO_SORT_RULE
    }
}

impl NormalizationRule for PushLimitIntoSort {
    fn apply(&self, plan: &mut LogicalPlan) -> Result<bool, DatabaseError> {
        let Operator::Limit(limit_op) = &plan.operator else {
            return Ok(false);
        };
        let Some(fetch) = limit_op.fetch() else {
            return Ok(false);
        };
        let sort = plan
            .childrens
            .only_mut()
            .and_then(|project| project.childrens.only_mut());

        if let Some(LogicalPlan {
            operator: Operator::Sort(sort_op),
            ..
        }) = sort
        {
            if sort_op.limit.map_or(true, |limit| limit > fetch) {
                sort_op.limit = Some(fetch);
                return Ok(true);
            }
        }

        Ok(false)
    }
}
