use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::{ColumnCatalog, ColumnRef};
use crate::errors::DatabaseError;
use crate::types::value::DataValue;
use crate::types::LogicalType;

pub type TableName = Arc<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct TableCatalog {
    pub(crate) name: TableName,
    /// Mapping from column names to column positions
    column_idxs: BTreeMap<String, usize>,
    pub(crate) columns: Vec<ColumnRef>,
    /// Column positions in primary key order
    primary_keys: Vec<usize>,
    salt_buckets: Option<u8>,
    split_points: Vec<Vec<DataValue>>,
}

impl TableCatalog {
    pub fn new(name: TableName, columns: Vec<ColumnCatalog>) -> Result<TableCatalog, DatabaseError> {
        let mut table_catalog = TableCatalog {
            name: Arc::new(name.to_lowercase()),
            column_idxs: BTreeMap::new(),
            columns: Vec::with_capacity(columns.len()),
            primary_keys: vec![],
            salt_buckets: None,
            split_points: vec![],
        };

        for col_catalog in columns.into_iter() {
            table_catalog.add_column(col_catalog)?;
        }
        let mut primary_keys = table_catalog
            .columns
            .iter()
            .enumerate()
            .filter_map(|(i, column)| column.desc.primary.map(|pos| (pos, i)))
            .collect::<Vec<_>>();
        primary_keys.sort_by_key(|(pos, _)| *pos);

        if primary_keys.is_empty() {
            return Err(DatabaseError::PrimaryKeyNotFound);
        }
        for (expected, (pos, i)) in primary_keys.iter().enumerate() {
            let column = &table_catalog.columns[*i];

            if expected != *pos {
                return Err(DatabaseError::InvalidColumn(format!(
                    "primary key position {} of column {} is not contiguous",
                    pos, column.name
                )));
            }
            if !column.datatype().can_be_primary_key() {
                return Err(DatabaseError::UnsupportedPrimaryKey(*column.datatype()));
            }
        }
        table_catalog.primary_keys = primary_keys.into_iter().map(|(_, i)| i).collect();

        Ok(table_catalog)
    }

    /// Prefix every row key with `hash(pk) % buckets`, one region per bucket.
    pub fn with_salt_buckets(mut self, buckets: u8) -> Result<Self, DatabaseError> {
        if buckets == 0 {
            return Err(DatabaseError::InvalidValue(
                "salt buckets must be positive".to_string(),
            ));
        }
        if !self.split_points.is_empty() {
            return Err(DatabaseError::InvalidValue(format!(
                "table {} is pre-split and can not be salted",
                self.name
            )));
        }
        self.salt_buckets = Some(buckets);

        Ok(self)
    }

    /// Pre-split an unsalted table at primary key prefixes.
    pub fn with_split_points(mut self, points: Vec<Vec<DataValue>>) -> Result<Self, DatabaseError> {
        if self.salt_buckets.is_some() {
            return Err(DatabaseError::InvalidValue(format!(
                "salted table {} can not be pre-split",
                self.name
            )));
        }
        let mut split_points = Vec::with_capacity(points.len());

        for point in points {
            if point.is_empty() || point.len() > self.primary_keys.len() {
                return Err(DatabaseError::MisMatch(self.primary_keys.len(), point.len()));
            }
            let point = point
                .into_iter()
                .zip(self.primary_keys())
                .map(|(value, column)| value.cast(column.datatype()))
                .collect::<Result<Vec<_>, _>>()?;
            split_points.push(point);
        }
        self.split_points = split_points;

        Ok(self)
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnRef> {
        self.columns.iter()
    }

    pub fn columns_len(&self) -> usize {
        self.columns.len()
    }

    pub fn types(&self) -> Vec<LogicalType> {
        self.columns.iter().map(|column| *column.datatype()).collect()
    }

    pub fn get_column_by_name(&self, name: &str) -> Option<&ColumnRef> {
        let idx = self.column_idxs.get(name)?;
        self.columns.get(*idx)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_idxs.contains_key(name)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnRef> {
        self.primary_keys.iter().map(|i| &self.columns[*i])
    }

    pub fn primary_keys_indices(&self) -> &[usize] {
        &self.primary_keys
    }

    pub fn salt_buckets(&self) -> Option<u8> {
        self.salt_buckets
    }

    pub fn split_points(&self) -> &[Vec<DataValue>] {
        &self.split_points
    }

    fn add_column(&mut self, mut col: ColumnCatalog) -> Result<usize, DatabaseError> {
        if self.column_idxs.contains_key(&col.name) {
            return Err(DatabaseError::DuplicateColumn(col.name.clone()));
        }
        let col_idx = self.columns.len();

        col.table_name = Some(self.name.clone());
        self.column_idxs.insert(col.name.clone(), col_idx);
        self.columns.push(Arc::new(col));

        Ok(col_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnDesc;

    #[test]
    // | k1 (Varchar) pk | k2 (Integer) pk desc | v (Boolean) |
    fn test_table_catalog() -> Result<(), DatabaseError> {
        let columns = vec![
            ColumnCatalog::new(
                "v".into(),
                true,
                ColumnDesc::new(LogicalType::Boolean, None, false),
            ),
            ColumnCatalog::new(
                "k2".into(),
                true,
                ColumnDesc::new(LogicalType::Integer, Some(1), true),
            ),
            ColumnCatalog::new(
                "K1".into(),
                false,
                ColumnDesc::new(LogicalType::Varchar(None), Some(0), false),
            ),
        ];
        let table_catalog = TableCatalog::new(Arc::new("T1".to_string()), columns)?;

        assert_eq!(table_catalog.name().as_str(), "t1");
        assert!(table_catalog.contains_column("k1"));
        assert!(!table_catalog.contains_column("k3"));

        let primary_keys = table_catalog
            .primary_keys()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(primary_keys, vec!["k1", "k2"]);

        let column = table_catalog.get_column_by_name("k2").unwrap();
        assert!(column.desc.is_descending());
        assert_eq!(column.table_name.as_deref().map(String::as_str), Some("t1"));

        Ok(())
    }

    #[test]
    fn test_table_catalog_rejects_bad_keys() {
        let no_primary = vec![ColumnCatalog::new(
            "a".into(),
            false,
            ColumnDesc::new(LogicalType::Integer, None, false),
        )];
        assert!(matches!(
            TableCatalog::new(Arc::new("t".to_string()), no_primary),
            Err(DatabaseError::PrimaryKeyNotFound)
        ));

        let decimal_primary = vec![ColumnCatalog::new(
            "a".into(),
            false,
            ColumnDesc::new(LogicalType::Decimal(Some(15), Some(2)), Some(0), false),
        )];
        assert!(matches!(
            TableCatalog::new(Arc::new("t".to_string()), decimal_primary),
            Err(DatabaseError::UnsupportedPrimaryKey(LogicalType::Decimal(_, _)))
        ));

        let duplicated = vec![
            ColumnCatalog::new(
                "a".into(),
                false,
                ColumnDesc::new(LogicalType::Integer, Some(0), false),
            ),
            ColumnCatalog::new(
                "A".into(),
                false,
                ColumnDesc::new(LogicalType::Integer, None, false),
            ),
        ];
        assert!(matches!(
            TableCatalog::new(Arc::new("t".to_string()), duplicated),
            Err(DatabaseError::DuplicateColumn(_))
        ));
    }
}
