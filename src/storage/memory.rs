use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ops::Bound;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::catalog::{TableCatalog, TableName};
use crate::errors::DatabaseError;
use crate::storage::{KeyRange, KeyValueIter, Region, RegionId, Storage};

const SCAN_BATCH_SIZE: usize = 64;

type KvMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Regions held in memory, stand-in for a distributed key-value store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_region_id: RegionId,
    regions: BTreeMap<RegionId, Arc<MemoryRegion>>,
    tables: HashMap<String, Vec<RegionId>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    type RegionType = MemoryRegion;

    fn create_regions(
        &self,
        table: &TableCatalog,
        ranges: Vec<KeyRange>,
    ) -> Result<Vec<RegionId>, DatabaseError> {
        let mut inner = self.inner.write();

        if inner.tables.contains_key(table.name().as_str()) {
            return Err(DatabaseError::DuplicateTable(table.name().to_string()));
        }
        let mut region_ids = Vec::with_capacity(ranges.len());

        for range in ranges {
            let id = inner.next_region_id;
            inner.next_region_id += 1;

            inner.regions.insert(
                id,
                Arc::new(MemoryRegion {
                    id,
                    table_name: table.name().clone(),
                    range,
                    data: RwLock::new(Arc::new(KvMap::new())),
                }),
            );
            region_ids.push(id);
        }
        debug!(
            "[Storage]: table {} created with regions {:?}",
            table.name(),
            region_ids
        );
        inner
            .tables
            .insert(table.name().to_string(), region_ids.clone());

        Ok(region_ids)
    }

    fn regions(&self, table_name: &str) -> Result<Vec<Arc<MemoryRegion>>, DatabaseError> {
        let inner = self.inner.read();
        let region_ids = inner
            .tables
            .get(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound(table_name.to_string()))?;

        Ok(region_ids
            .iter()
            .filter_map(|id| inner.regions.get(id).cloned())
            .collect())
    }

    fn region(&self, id: RegionId) -> Option<Arc<MemoryRegion>> {
        self.inner.read().regions.get(&id).cloned()
    }

    fn region_ids(&self) -> Vec<RegionId> {
        self.inner.read().regions.keys().copied().collect()
    }
}

#[derive(Debug)]
pub struct MemoryRegion {
    id: RegionId,
    table_name: TableName,
    range: KeyRange,
    /// Copy-on-write: scans hold the snapshot they started with
    data: RwLock<Arc<KvMap>>,
}

impl MemoryRegion {
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Region for MemoryRegion {
    fn id(&self) -> RegionId {
        self.id
    }

    fn table_name(&self) -> &TableName {
        &self.table_name
    }

    fn range(&self) -> &KeyRange {
        &self.range
    }

    fn scan(&self, range: &KeyRange) -> Result<KeyValueIter, DatabaseError> {
        let snapshot = self.data.read().clone();
        let finished = matches!(
            (&range.start, &range.end),
            (
                Bound::Included(start) | Bound::Excluded(start),
                Bound::Included(end) | Bound::Excluded(end)
            ) if start > end
        );

        Ok(Box::new(SnapshotIter {
            snapshot,
            cursor: range.start.clone(),
            end: range.end.clone(),
            buffer: VecDeque::with_capacity(SCAN_BATCH_SIZE),
            finished,
        }))
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), DatabaseError> {
        if !self.range.contains(&key) {
            return Err(DatabaseError::InvalidValue(format!(
                "key {:?} is outside region {}",
                key, self.id
            )));
        }
        let mut data = self.data.write();
        Arc::make_mut(&mut *data).insert(key, value);

        Ok(())
    }
}

/// Walks a snapshot in batches, resuming after the last key it returned.
struct SnapshotIter {
    snapshot: Arc<KvMap>,
    cursor: Bound<Vec<u8>>,
    end: Bound<Vec<u8>>,
    buffer: VecDeque<(Vec<u8>, Vec<u8>)>,
    finished: bool,
}

impl SnapshotIter {
    fn fill(&mut self) {
        let range = (self.cursor.clone(), self.end.clone());

        for (key, value) in self.snapshot.range(range).take(SCAN_BATCH_SIZE) {
            self.buffer.push_back((key.clone(), value.clone()));
        }
        match self.buffer.back() {
            Some((key, _)) if self.buffer.len() == SCAN_BATCH_SIZE => {
                self.cursor = Bound::Excluded(key.clone());
            }
            _ => self.finished = true,
        }
    }
}

impl Iterator for SnapshotIter {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.finished {
            self.fill();
        }
        self.buffer.pop_front()
    }
}

#[cfg(test)]
mod test {
    use crate::catalog::{ColumnCatalog, ColumnDesc, TableCatalog};
    use crate::errors::DatabaseError;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{KeyRange, Region, Storage};
    use crate::types::LogicalType;
    use itertools::Itertools;
    use std::sync::Arc;

    #[test]
    fn test_region_scan_snapshot() -> Result<(), DatabaseError> {
        let table = TableCatalog::new(
            Arc::new("t1".to_string()),
            vec![ColumnCatalog::new(
                "k".to_string(),
                false,
                ColumnDesc::new(LogicalType::Integer, Some(0), false),
            )],
        )?;
        let storage = MemoryStorage::new();
        storage.create_regions(&table, vec![KeyRange::full()])?;
        assert!(matches!(
            storage.create_regions(&table, vec![KeyRange::full()]),
            Err(DatabaseError::DuplicateTable(_))
        ));

        let region = storage.regions("t1")?.pop().unwrap();
        for i in (0..200_u8).rev() {
            region.put(vec![i], vec![i])?;
        }
        let iter = region.scan(&KeyRange::new(Some(vec![10]), Some(vec![150])))?;
        region.put(vec![100, 1], vec![0])?;

        let keys = iter.map(|(key, _)| key).collect_vec();
        assert_eq!(keys.len(), 140);
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(region.len(), 201);

        Ok(())
    }
}
