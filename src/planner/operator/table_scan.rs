use super::Operator;
use crate::catalog::{ColumnRef, TableCatalog, TableName};
use crate::planner::{Childrens, LogicalPlan};
use itertools::Itertools;
use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct TableScanOperator {
    pub(crate) table_name: TableName,
    pub(crate) columns: Vec<ColumnRef>,
    /// Primary key columns in key order
    pub(crate) primary_keys: Vec<ColumnRef>,
    pub(crate) salt_buckets: Option<u8>,
}

impl TableScanOperator {
    pub fn build(table_catalog: &TableCatalog) -> LogicalPlan {
        LogicalPlan::new(
            Operator::TableScan(TableScanOperator {
                table_name: table_catalog.name().clone(),
                columns: table_catalog.columns().cloned().collect_vec(),
                primary_keys: table_catalog.primary_keys().cloned().collect_vec(),
                salt_buckets: table_catalog.salt_buckets(),
            }),
            Childrens::None,
        )
    }

    pub fn is_salted(&self) -> bool {
        self.salt_buckets.is_some()
    }
}

impl fmt::Display for TableScanOperator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let projection_columns = self
            .columns
            .iter()
            .map(|column| column.name.clone())
            .join(", ");
        write!(f, "TableScan {} -> [{}]", self.table_name, projection_columns)?;

        if let Some(buckets) = self.salt_buckets {
            write!(f, ", Salt Buckets: {}", buckets)?;
        }

        Ok(())
    }
}
