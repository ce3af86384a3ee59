use crate::errors::DatabaseError;
use crate::storage::RegionId;
use ahash::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// A row key at which a region can be split into scan chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidepost {
    pub partition_id: RegionId,
    pub split_key: Vec<u8>,
    pub cumulative_byte_count: u64,
    pub cumulative_row_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub partition_id: RegionId,
    /// Ascending by key and by byte count
    pub guideposts: Vec<Guidepost>,
    pub row_count: u64,
    pub byte_count: u64,
    /// Milliseconds since the unix epoch
    pub last_update_timestamp: i64,
    pub byte_depth: u64,
}

impl PartitionStats {
    /// Collected less than `min_update_frequency_ms` before `now`.
    pub fn is_fresh(&self, now: i64, min_update_frequency_ms: i64) -> bool {
        now.saturating_sub(self.last_update_timestamp) < min_update_frequency_ms
    }

    pub fn split_keys(&self) -> Vec<Vec<u8>> {
        self.guideposts
            .iter()
            .map(|guidepost| guidepost.split_key.clone())
            .collect()
    }
}

/// The persisted statistics record of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsMeta {
    table_name: String,
    stats: PartitionStats,
}

impl StatisticsMeta {
    pub fn new(table_name: String, stats: PartitionStats) -> Self {
        StatisticsMeta { table_name, stats }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn stats(&self) -> &PartitionStats {
        &self.stats
    }

    pub fn into_stats(self) -> PartitionStats {
        self.stats
    }

    /// Writes next to `path` first and renames over it, so readers never see
    /// a half written record.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        bincode::serialize_into(&mut file, self)?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let file = OpenOptions::new().read(true).open(path)?;

        Ok(bincode::deserialize_from(file)?)
    }
}

/// Latest statistics per region. Readers clone the `Arc` and are never
/// blocked by a collection that is still running.
#[derive(Default)]
pub struct StatisticsMetaCache {
    inner: RwLock<HashMap<RegionId, Arc<PartitionStats>>>,
}

impl StatisticsMetaCache {
    pub fn get(&self, region_id: RegionId) -> Option<Arc<PartitionStats>> {
        self.inner.read().get(&region_id).cloned()
    }

    pub fn insert(&self, stats: PartitionStats) -> Arc<PartitionStats> {
        let stats = Arc::new(stats);
        self.inner.write().insert(stats.partition_id, stats.clone());

        stats
    }

    pub fn remove(&self, region_id: RegionId) -> Option<Arc<PartitionStats>> {
        self.inner.write().remove(&region_id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::DatabaseError;
    use crate::optimizer::core::histogram::GuidepostBuilder;
    use crate::optimizer::core::statistics_meta::{StatisticsMeta, StatisticsMetaCache};
    use tempfile::TempDir;

    #[test]
    fn test_to_file_and_from_file() -> Result<(), DatabaseError> {
        let temp_dir = TempDir::new().expect("unable to create temporary working directory");
        let path = temp_dir.path().join("3");

        let mut builder = GuidepostBuilder::new(3, 16);
        for i in 0..8u8 {
            builder.append(&[i], &[i; 7]);
        }
        let meta = StatisticsMeta::new("t1".to_string(), builder.build(1000));

        meta.to_file(&path)?;
        // replaced, not appended
        meta.to_file(&path)?;
        let loaded = StatisticsMeta::from_file(&path)?;

        assert_eq!(loaded, meta);
        assert_eq!(loaded.stats().guideposts.len(), 4);
        assert!(!path.with_extension("tmp").exists());

        Ok(())
    }

    #[test]
    fn test_cache_swap() {
        let cache = StatisticsMetaCache::default();
        let first = cache.insert(GuidepostBuilder::new(1, 10).build(1));
        let second = cache.insert(GuidepostBuilder::new(1, 10).build(2));

        assert_eq!(first.last_update_timestamp, 1);
        assert_eq!(cache.get(1).map(|stats| stats.last_update_timestamp), Some(2));
        assert_eq!(second.last_update_timestamp, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.remove(1).is_some());
        assert!(cache.is_empty());
    }
}
