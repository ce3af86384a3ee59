use crate::catalog::TableName;
use crate::types::LogicalType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type ColumnRef = Arc<ColumnCatalog>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnCatalog {
    pub name: String,
    /// `None` for columns produced by an expression rather than read from a table
    pub table_name: Option<TableName>,
    pub nullable: bool,
    pub desc: ColumnDesc,
}

impl ColumnCatalog {
    pub fn new(column_name: String, nullable: bool, column_desc: ColumnDesc) -> ColumnCatalog {
        ColumnCatalog {
            name: column_name.to_lowercase(),
            table_name: None,
            nullable,
            desc: column_desc,
        }
    }

    /// A computed column; keeps the name exactly as rendered.
    pub(crate) fn new_dummy(column_name: String, nullable: bool, ty: LogicalType) -> ColumnCatalog {
        ColumnCatalog {
            name: column_name,
            table_name: None,
            nullable,
            desc: ColumnDesc::new(ty, None, false),
        }
    }

    pub fn datatype(&self) -> &LogicalType {
        &self.desc.column_datatype
    }

    pub fn full_name(&self) -> String {
        if let Some(table_name) = &self.table_name {
            return format!("{}.{}", table_name, self.name);
        }
        self.name.clone()
    }
}

/// The descriptor of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub(crate) column_datatype: LogicalType,
    /// Position of the column inside the primary key
    pub(crate) primary: Option<usize>,
    /// Primary key column stored in descending order
    pub(crate) descending: bool,
}

impl ColumnDesc {
    pub const fn new(
        column_datatype: LogicalType,
        primary: Option<usize>,
        descending: bool,
    ) -> ColumnDesc {
        ColumnDesc {
            column_datatype,
            primary,
            descending,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }
}
