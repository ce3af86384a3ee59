use crate::errors::DatabaseError;
use crate::optimizer::core::rule::{MatchPattern, NormalizationRule};
use crate::optimizer::heuristic::batch::{HepBatch, HepBatchStrategy};
use crate::optimizer::heuristic::matcher::PlanMatcher;
use crate::optimizer::rule::normalization::NormalizationRuleImpl;
use crate::planner::LogicalPlan;
use log::debug;
use std::mem;

pub struct HepOptimizer {
    batches: Vec<HepBatch>,
    plan: LogicalPlan,
}

impl HepOptimizer {
    pub fn new(root: LogicalPlan) -> Self {
        Self {
            batches: vec![],
            plan: root,
        }
    }

    pub fn batch(
        mut self,
        name: String,
        strategy: HepBatchStrategy,
        rules: Vec<NormalizationRuleImpl>,
    ) -> Self {
        self.batches.push(HepBatch::new(name, strategy, rules));
        self
    }

    pub fn find_best(mut self) -> Result<LogicalPlan, DatabaseError> {
        for batch in mem::take(&mut self.batches) {
            let mut iteration = 1usize;

            while iteration <= batch.strategy.max_iteration {
                if !self.apply_batch(&batch)? {
                    break;
                }

                iteration += 1;
            }
        }

        Ok(self.plan)
    }

    fn apply_batch(
        &mut self,
        HepBatch { name, rules, .. }: &HepBatch,
    ) -> Result<bool, DatabaseError> {
        let mut has_apply = false;

        for rule in rules {
            if Self::apply_rule(rule, &mut self.plan)? {
                debug!("[Optimizer]: batch `{}` applied {:?}", name, rule);
                has_apply = true;
            }
        }

        Ok(has_apply)
    }

    /// Applies `rule` at the first node, from the root down, where it changes the plan.
    fn apply_rule(rule: &NormalizationRuleImpl, plan: &mut LogicalPlan) -> Result<bool, DatabaseError> {
        if Self::try_apply(rule, plan)? {
            return Ok(true);
        }
        match plan.childrens.only_mut() {
            Some(child) => Self::apply_rule(rule, child),
            None => Ok(false),
        }
    }

    fn try_apply(rule: &NormalizationRuleImpl, plan: &mut LogicalPlan) -> Result<bool, DatabaseError> {
        if PlanMatcher::new(rule.pattern(), plan).match_opt_expr() {
            rule.apply(plan)
        } else {
            Ok(false)
        }
    }
}
