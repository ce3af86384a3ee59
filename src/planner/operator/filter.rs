use super::Operator;
use crate::expression::ScalarExpression;
use crate::planner::{Childrens, LogicalPlan};
use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct FilterOperator {
    pub predicate: ScalarExpression,
}

impl FilterOperator {
    pub fn build(predicate: ScalarExpression, children: LogicalPlan) -> LogicalPlan {
        LogicalPlan::new(
            Operator::Filter(FilterOperator { predicate }),
            Childrens::Only(children),
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Filter {}", self.predicate)
    }
}
