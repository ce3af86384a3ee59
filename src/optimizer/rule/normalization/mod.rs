use crate::errors::DatabaseError;
use crate::optimizer::core::pattern::Pattern;
use crate::optimizer::core::rule::{MatchPattern, NormalizationRule};
use crate::optimizer::rule::normalization::order_elimination::EliminateRedundantSort;
use crate::optimizer::rule::normalization::pushdown_limit::PushLimitIntoSort;
use crate::planner::LogicalPlan;

mod order_elimination;
mod pushdown_limit;

#[derive(Debug, Copy, Clone)]
pub enum NormalizationRuleImpl {
    // PushDown limit
    PushLimitIntoSort,
    // Tips: run after `PushLimitIntoSort` so an elided sort keeps its limit
    EliminateRedundantSort,
}

impl MatchPattern for NormalizationRuleImpl {
    fn pattern(&self) -> &Pattern {
        match self {
            NormalizationRuleImpl::PushLimitIntoSort => PushLimitIntoSort.pattern(),
            NormalizationRuleImpl::EliminateRedundantSort => EliminateRedundantSort.pattern(),
        }
    }
}

impl NormalizationRule for NormalizationRuleImpl {
    fn apply(&self, plan: &mut LogicalPlan) -> Result<bool, DatabaseError> {
        match self {
            NormalizationRuleImpl::PushLimitIntoSort => PushLimitIntoSort.apply(plan),
            NormalizationRuleImpl::EliminateRedundantSort => EliminateRedundantSort.apply(plan),
        }
    }
}
