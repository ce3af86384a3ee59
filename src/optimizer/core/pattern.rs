use crate::planner::operator::Operator;

pub enum PatternChildrenPredicate {
    /// Each pattern must match the child at the same position.
    Predicate(Vec<Pattern>),
    /// Children are not inspected.
    None,
}

/// Shape of the plan subtree a rule rewrites.
pub struct Pattern {
    /// Tested against the operator of the subtree root only.
    pub predicate: fn(&Operator) -> bool,
    pub children: PatternChildrenPredicate,
}
