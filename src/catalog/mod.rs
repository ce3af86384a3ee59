pub(crate) mod column;
pub(crate) mod table;

pub use column::{ColumnCatalog, ColumnDesc, ColumnRef};
pub use table::{TableCatalog, TableName};
