pub mod memory;
pub(crate) mod table_codec;

use crate::catalog::{TableCatalog, TableName};
use crate::errors::DatabaseError;
use std::ops::Bound;
use std::sync::Arc;

pub type RegionId = u32;

pub type KeyValueIter = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + Send>;

/// A key range; `start` is always `Included` or `Unbounded`, `end` `Excluded` or `Unbounded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Bound<Vec<u8>>,
    pub end: Bound<Vec<u8>>,
}

impl KeyRange {
    pub fn full() -> Self {
        KeyRange {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    pub fn new(start: Option<Vec<u8>>, end: Option<Vec<u8>>) -> Self {
        KeyRange {
            start: start.map(Bound::Included).unwrap_or(Bound::Unbounded),
            end: end.map(Bound::Excluded).unwrap_or(Bound::Unbounded),
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = match &self.start {
            Bound::Included(start) => key >= start.as_slice(),
            Bound::Excluded(start) => key > start.as_slice(),
            Bound::Unbounded => true,
        };
        let before_end = match &self.end {
            Bound::Included(end) => key <= end.as_slice(),
            Bound::Excluded(end) => key < end.as_slice(),
            Bound::Unbounded => true,
        };
        after_start && before_end
    }

    /// Cuts the range at `keys` (sorted), keeping only the cut points inside it.
    pub fn split_at(&self, keys: &[Vec<u8>]) -> Vec<KeyRange> {
        let mut ranges = Vec::with_capacity(keys.len() + 1);
        let mut start = self.start.clone();

        for key in keys {
            if !self.contains(key) || Bound::Included(key.clone()) == start {
                continue;
            }
            ranges.push(KeyRange {
                start: start.clone(),
                end: Bound::Excluded(key.clone()),
            });
            start = Bound::Included(key.clone());
        }
        ranges.push(KeyRange {
            start,
            end: self.end.clone(),
        });
        ranges
    }
}

/// One partition of a table: a contiguous key range sorted by row key.
pub trait Region: Send + Sync + 'static {
    fn id(&self) -> RegionId;

    fn table_name(&self) -> &TableName;

    fn range(&self) -> &KeyRange;

    /// Scans `range` of a snapshot of this region in key order.
    fn scan(&self, range: &KeyRange) -> Result<KeyValueIter, DatabaseError>;

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), DatabaseError>;
}

pub trait Storage: Send + Sync + 'static {
    type RegionType: Region;

    /// Creates one region per range, `ranges` sorted by key.
    fn create_regions(
        &self,
        table: &TableCatalog,
        ranges: Vec<KeyRange>,
    ) -> Result<Vec<RegionId>, DatabaseError>;

    /// Regions of a table in key order.
    fn regions(&self, table_name: &str) -> Result<Vec<Arc<Self::RegionType>>, DatabaseError>;

    fn region(&self, id: RegionId) -> Option<Arc<Self::RegionType>>;

    /// Every region of every table.
    fn region_ids(&self) -> Vec<RegionId>;
}

#[cfg(test)]
mod test {
    use crate::storage::KeyRange;
    use std::ops::Bound;

    #[test]
    fn test_key_range_split_at() {
        let range = KeyRange::new(Some(vec![1]), Some(vec![9]));
        let ranges = range.split_at(&[vec![0], vec![1], vec![3], vec![5, 1], vec![9]]);

        assert_eq!(
            ranges,
            vec![
                KeyRange::new(Some(vec![1]), Some(vec![3])),
                KeyRange::new(Some(vec![3]), Some(vec![5, 1])),
                KeyRange::new(Some(vec![5, 1]), Some(vec![9])),
            ]
        );
        assert!(ranges[1].contains(&[4, 255]));
        assert!(!ranges[1].contains(&[5, 1]));

        let full = KeyRange::full().split_at(&[vec![2]]);
        assert_eq!(full[0].start, Bound::Unbounded);
        assert_eq!(full[1].end, Bound::Unbounded);
    }
}
