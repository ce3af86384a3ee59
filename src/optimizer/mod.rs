/// The core concepts shared by the optimizer rules.
pub mod core;
/// Rule-based rewriting of the logical plan.
pub mod heuristic;
pub mod rule;
