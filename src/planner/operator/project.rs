use super::Operator;
use crate::expression::ScalarExpression;
use crate::planner::{Childrens, LogicalPlan};
use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct ProjectOperator {
    pub exprs: Vec<ScalarExpression>,
}

impl ProjectOperator {
    pub fn build(exprs: Vec<ScalarExpression>, children: LogicalPlan) -> LogicalPlan {
        LogicalPlan::new(
            Operator::Project(ProjectOperator { exprs }),
            Childrens::Only(children),
        )
    }
}

impl fmt::Display for ProjectOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let exprs = self.exprs.iter().map(|expr| format!("{}", expr)).join(", ");

        write!(f, "Projection [{}]", exprs)
    }
}
