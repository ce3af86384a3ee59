use crate::errors::DatabaseError;
use crate::optimizer::core::pattern::Pattern;
use crate::planner::LogicalPlan;

pub trait MatchPattern {
    fn pattern(&self) -> &Pattern;
}

pub trait NormalizationRule: MatchPattern {
    /// Rewrites the plan rooted at a matched node, returning whether it changed.
    fn apply(&self, plan: &mut LogicalPlan) -> Result<bool, DatabaseError>;
}
