use super::Operator;
use crate::planner::{Childrens, LogicalPlan};
use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct LimitOperator {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl LimitOperator {
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Self {
        LimitOperator { offset, limit }
    }

    pub fn build(offset: Option<usize>, limit: Option<usize>, children: LogicalPlan) -> LogicalPlan {
        LogicalPlan::new(
            Operator::Limit(LimitOperator::new(offset, limit)),
            Childrens::Only(children),
        )
    }

    /// Rows the child has to produce at most.
    pub fn fetch(&self) -> Option<usize> {
        self.limit
            .map(|limit| limit.saturating_add(self.offset.unwrap_or(0)))
    }
}

impl fmt::Display for LimitOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Some(limit) = self.limit {
            write!(f, "Limit {}", limit)?;
        }
        if self.limit.is_some() && self.offset.is_some() {
            write!(f, ", ")?;
        }
        if let Some(offset) = self.offset {
            write!(f, "Offset {}", offset)?;
        }

        Ok(())
    }
}
