pub mod operator;

use crate::catalog::ColumnRef;
use crate::planner::operator::Operator;
use crate::types::tuple::SchemaRef;
use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum Childrens {
    None,
    Only(LogicalPlan),
}

impl Childrens {
    pub fn iter(&self) -> ChildrensIter {
        ChildrensIter {
            inner: self,
            pos: 0,
        }
    }

    pub fn only(&self) -> Option<&LogicalPlan> {
        match self {
            Childrens::Only(plan) => Some(plan),
            Childrens::None => None,
        }
    }

    pub fn only_mut(&mut self) -> Option<&mut LogicalPlan> {
        match self {
            Childrens::Only(plan) => Some(plan),
            Childrens::None => None,
        }
    }
}

pub struct ChildrensIter<'a> {
    inner: &'a Childrens,
    pos: usize,
}

impl<'a> Iterator for ChildrensIter<'a> {
    type Item = &'a LogicalPlan;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner {
            Childrens::Only(plan) if self.pos == 0 => {
                self.pos += 1;
                Some(plan)
            }
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct LogicalPlan {
    pub(crate) operator: Operator,
    pub(crate) childrens: Box<Childrens>,
}

impl LogicalPlan {
    pub fn new(operator: Operator, childrens: Childrens) -> Self {
        Self {
            operator,
            childrens: Box::new(childrens),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    pub fn child(&self) -> Option<&LogicalPlan> {
        self.childrens.only()
    }

    /// Detaches the only child, leaving this node childless.
    pub(crate) fn take_child(&mut self) -> Option<LogicalPlan> {
        match std::mem::replace(self.childrens.as_mut(), Childrens::None) {
            Childrens::Only(plan) => Some(plan),
            Childrens::None => None,
        }
    }

    pub fn output_schema(&self) -> SchemaRef {
        let columns: Vec<ColumnRef> = match &self.operator {
            Operator::Filter(_) | Operator::Sort(_) | Operator::Limit(_) => {
                return self
                    .child()
                    .map(LogicalPlan::output_schema)
                    .unwrap_or_default()
            }
            Operator::Aggregate(op) => op
                .agg_calls
                .iter()
                .chain(op.groupby_exprs.iter())
                .map(|expr| expr.output_column())
                .collect_vec(),
            Operator::Project(op) => op.exprs.iter().map(|expr| expr.output_column()).collect_vec(),
            Operator::TableScan(op) => op.columns.clone(),
        };
        Arc::new(columns)
    }

    /// Whether any node of the plan is of the given kind.
    pub fn contains(&self, predicate: fn(&Operator) -> bool) -> bool {
        predicate(&self.operator) || self.childrens.iter().any(|child| child.contains(predicate))
    }

    pub fn explain(&self, indentation: usize) -> String {
        let mut result = format!("{:indent$}{}", "", self.operator, indent = indentation);

        for child in self.childrens.iter() {
            result.push('\n');
            result.push_str(&child.explain(indentation + 2));
        }

        result
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.explain(0))
    }
}
