use crate::optimizer::rule::normalization::NormalizationRuleImpl;

/// Rules applied together, pass after pass, until the plan stops changing.
#[derive(Clone)]
pub struct HepBatch {
    pub name: String,
    pub strategy: HepBatchStrategy,
    pub rules: Vec<NormalizationRuleImpl>,
}

impl HepBatch {
    pub fn new(
        name: String,
        strategy: HepBatchStrategy,
        rules: Vec<NormalizationRuleImpl>,
    ) -> Self {
        Self {
            name,
            strategy,
            rules,
        }
    }
}

/// Each pass walks the plan from the root down and rewrites the first node a
/// rule matches.
#[derive(Clone, Copy)]
pub struct HepBatchStrategy {
    /// Upper bound on passes; a pass that changes nothing ends the batch early.
    pub max_iteration: usize,
}

impl HepBatchStrategy {
    pub fn fix_point_topdown(max_iteration: usize) -> Self {
        HepBatchStrategy { max_iteration }
    }
}
