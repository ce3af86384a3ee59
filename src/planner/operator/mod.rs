pub mod aggregate;
pub mod filter;
pub mod limit;
pub mod project;
pub mod sort;
pub mod table_scan;

use self::{
    aggregate::AggregateOperator, filter::FilterOperator, limit::LimitOperator,
    project::ProjectOperator, sort::SortOperator, table_scan::TableScanOperator,
};
use crate::catalog::ColumnRef;
use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum Operator {
    Aggregate(AggregateOperator),
    Filter(FilterOperator),
    Project(ProjectOperator),
    TableScan(TableScanOperator),
    Sort(SortOperator),
    Limit(LimitOperator),
}

impl Operator {
    pub fn referenced_columns(&self) -> Vec<ColumnRef> {
        match self {
            Operator::Aggregate(op) => op
                .agg_calls
                .iter()
                .chain(op.groupby_exprs.iter())
                .flat_map(|expr| expr.referenced_columns())
                .collect_vec(),
            Operator::Filter(op) => op.predicate.referenced_columns(),
            Operator::Project(op) => op
                .exprs
                .iter()
                .flat_map(|expr| expr.referenced_columns())
                .collect_vec(),
            Operator::TableScan(op) => op.columns.clone(),
            Operator::Sort(op) => op
                .sort_fields
                .iter()
                .flat_map(|field| field.expr.referenced_columns())
                .collect_vec(),
            Operator::Limit(_) => vec![],
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operator::Aggregate(op) => write!(f, "{}", op),
            Operator::Filter(op) => write!(f, "{}", op),
            Operator::Project(op) => write!(f, "{}", op),
            Operator::TableScan(op) => write!(f, "{}", op),
            Operator::Sort(op) => write!(f, "{}", op),
            Operator::Limit(op) => write!(f, "{}", op),
        }
    }
}
