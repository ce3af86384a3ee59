use crate::db::DatabaseOptions;
use crate::errors::DatabaseError;
use crate::optimizer::core::histogram::GuidepostBuilder;
use crate::optimizer::core::statistics_meta::{PartitionStats, StatisticsMeta, StatisticsMetaCache};
use crate::statistics::now_millis;
use crate::storage::{Region, RegionId, Storage};
use crate::utils::thread::{catch_unwind, named_spawn};
use ahash::{HashMap, HashSet};
use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Result of one collection request.
#[derive(Debug, Clone)]
pub struct CollectOutcome {
    pub stats: Arc<PartitionStats>,
    /// `false` when fresh statistics were returned without scanning
    pub scanned: bool,
}

type SharedResult = Result<CollectOutcome, String>;

/// The single collection of a region that is queued or running. Every
/// request for the region made meanwhile waits on it.
#[derive(Default)]
struct InFlight {
    result: Mutex<Option<SharedResult>>,
    ready: Condvar,
}

impl InFlight {
    fn complete(&self, result: SharedResult) {
        *self.result.lock() = Some(result);
        self.ready.notify_all();
    }

    fn wait(&self) -> SharedResult {
        let mut result = self.result.lock();

        loop {
            if let Some(result) = result.as_ref() {
                return result.clone();
            }
            self.ready.wait(&mut result);
        }
    }
}

enum HandleState {
    Ready(CollectOutcome),
    Pending(Arc<InFlight>),
}

pub struct CollectHandle {
    region_id: RegionId,
    state: HandleState,
}

impl CollectHandle {
    pub fn region_id(&self) -> RegionId {
        self.region_id
    }

    /// Blocks until the collection finished.
    pub fn wait(self) -> Result<CollectOutcome, DatabaseError> {
        match self.state {
            HandleState::Ready(outcome) => Ok(outcome),
            HandleState::Pending(in_flight) => in_flight
                .wait()
                .map_err(|message| DatabaseError::CollectFailed(self.region_id, message)),
        }
    }
}

struct Job {
    region_id: RegionId,
    byte_depth: u64,
    min_update_frequency: Duration,
    in_flight: Arc<InFlight>,
}

struct Inner<S: Storage> {
    storage: Arc<S>,
    cache: Arc<StatisticsMetaCache>,
    options: Arc<DatabaseOptions>,
    in_flight: Mutex<HashMap<RegionId, Arc<InFlight>>>,
}

impl<S: Storage> Inner<S> {
    fn cached_fresh(
        &self,
        region_id: RegionId,
        min_update_frequency: Duration,
    ) -> Option<CollectOutcome> {
        let stats = self.cache.get(region_id)?;

        stats
            .is_fresh(now_millis(), min_update_frequency.as_millis() as i64)
            .then_some(CollectOutcome {
                stats,
                scanned: false,
            })
    }

    fn submit(
        &self,
        sender: &SyncSender<Job>,
        region_id: RegionId,
        byte_depth: u64,
        min_update_frequency: Duration,
    ) -> Result<CollectHandle, DatabaseError> {
        if let Some(outcome) = self.cached_fresh(region_id, min_update_frequency) {
            debug!("[Statistics]: region {} is fresh, skipped", region_id);
            return Ok(CollectHandle {
                region_id,
                state: HandleState::Ready(outcome),
            });
        }
        let mut in_flight = self.in_flight.lock();

        if let Some(running) = in_flight.get(&region_id) {
            return Ok(CollectHandle {
                region_id,
                state: HandleState::Pending(running.clone()),
            });
        }
        let running = Arc::new(InFlight::default());
        let job = Job {
            region_id,
            byte_depth,
            min_update_frequency,
            in_flight: running.clone(),
        };

        match sender.try_send(job) {
            Ok(()) => {
                in_flight.insert(region_id, running.clone());

                Ok(CollectHandle {
                    region_id,
                    state: HandleState::Pending(running),
                })
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    "[Statistics]: queue is full, collection of region {} rejected",
                    region_id
                );
                Err(DatabaseError::CollectorBackpressure(region_id))
            }
            Err(TrySendError::Disconnected(_)) => Err(DatabaseError::ChannelClose),
        }
    }

    fn process(&self, job: Job) {
        let region_id = job.region_id;
        let result = catch_unwind(|| self.collect(&job))
            .and_then(|result| result)
            .map_err(|err| {
                error!("[Statistics]: region {} failed: {}", region_id, err);
                err.to_string()
            });

        self.in_flight.lock().remove(&region_id);
        job.in_flight.complete(result);
    }

    fn collect(&self, job: &Job) -> Result<CollectOutcome, DatabaseError> {
        // a job queued behind another one for the same region finds it done
        if let Some(outcome) = self.cached_fresh(job.region_id, job.min_update_frequency) {
            return Ok(outcome);
        }
        let region = self.storage.region(job.region_id).ok_or_else(|| {
            DatabaseError::InvalidValue(format!("region {} does not exist", job.region_id))
        })?;
        let mut builder = GuidepostBuilder::new(job.region_id, job.byte_depth);

        for (key, value) in region.scan(region.range())? {
            builder.append(&key, &value);
        }
        let stats = builder.build(now_millis());

        if let Some(dir) = self.table_dir(region.table_name()) {
            fs::create_dir_all(&dir)?;
            StatisticsMeta::new(region.table_name().to_string(), stats.clone())
                .to_file(dir.join(job.region_id.to_string()))?;
        }
        info!(
            "[Statistics]: region {} of {} collected, {} rows, {} bytes, {} guideposts",
            job.region_id,
            region.table_name(),
            stats.row_count,
            stats.byte_count,
            stats.guideposts.len()
        );

        Ok(CollectOutcome {
            stats: self.cache.insert(stats),
            scanned: true,
        })
    }

    fn table_dir(&self, table_name: &str) -> Option<PathBuf> {
        self.options
            .stats_dir
            .as_ref()
            .map(|dir| dir.join(table_name))
    }
}

/// Background collection of region statistics.
///
/// A bounded queue feeds a fixed pool of worker threads. At most one
/// collection per region is queued or running at a time.
pub struct StatisticsCollector<S: Storage> {
    inner: Arc<Inner<S>>,
    sender: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
    scheduler: Mutex<Option<(mpsc::Sender<()>, JoinHandle<()>)>>,
}

impl<S: Storage> StatisticsCollector<S> {
    pub fn new(
        storage: Arc<S>,
        cache: Arc<StatisticsMetaCache>,
        options: Arc<DatabaseOptions>,
    ) -> Result<Self, DatabaseError> {
        let (sender, receiver) = mpsc::sync_channel(options.collector_queue_size);
        let receiver = Arc::new(Mutex::new(receiver));
        let inner = Arc::new(Inner {
            storage,
            cache,
            options,
            in_flight: Mutex::new(HashMap::default()),
        });
        let mut workers = Vec::with_capacity(inner.options.collector_pool_size);

        for i in 0..inner.options.collector_pool_size.max(1) {
            let inner = inner.clone();
            let receiver: Arc<Mutex<Receiver<Job>>> = receiver.clone();

            workers.push(named_spawn(format!("stats-collector-{}", i), move || {
                loop {
                    let job = receiver.lock().recv();

                    match job {
                        Ok(job) => inner.process(job),
                        Err(_) => break,
                    }
                }
            })?);
        }

        Ok(StatisticsCollector {
            inner,
            sender: Some(sender),
            workers,
            scheduler: Mutex::new(None),
        })
    }

    /// Queues a collection of `region_id` unless its statistics are younger
    /// than `min_update_frequency`.
    pub fn collect(
        &self,
        region_id: RegionId,
        byte_depth: u64,
        min_update_frequency: Duration,
    ) -> Result<CollectHandle, DatabaseError> {
        let sender = self.sender.as_ref().ok_or(DatabaseError::ChannelClose)?;

        self.inner
            .submit(sender, region_id, byte_depth, min_update_frequency)
    }

    pub fn collect_blocking(
        &self,
        region_id: RegionId,
        byte_depth: u64,
        min_update_frequency: Duration,
    ) -> Result<CollectOutcome, DatabaseError> {
        self.collect(region_id, byte_depth, min_update_frequency)?
            .wait()
    }

    /// Collection with the configured byte depth and update frequency.
    pub fn collect_default(&self, region_id: RegionId) -> Result<CollectHandle, DatabaseError> {
        let options = &self.inner.options;

        self.collect(
            region_id,
            options.histogram_byte_depth,
            options.stats_update_frequency,
        )
    }

    /// A major compaction rewrites the region, so its statistics are
    /// collected again regardless of their age.
    pub fn on_major_compaction(&self, region_id: RegionId) -> Result<CollectHandle, DatabaseError> {
        info!("[Statistics]: major compaction of region {}", region_id);
        self.collect(region_id, self.inner.options.histogram_byte_depth, Duration::ZERO)
    }

    /// Collects every region of the store each `interval`, replacing a
    /// previous schedule.
    pub fn schedule(&self, interval: Duration) -> Result<(), DatabaseError> {
        self.stop_schedule();

        let sender = self.sender.clone().ok_or(DatabaseError::ChannelClose)?;
        let inner = self.inner.clone();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = named_spawn("stats-scheduler".to_string(), move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => (),
                _ => break,
            }
            let region_ids = inner.storage.region_ids();
            debug!("[Statistics]: scheduled run over {} regions", region_ids.len());

            for region_id in region_ids {
                if let Err(err) = inner.submit(
                    &sender,
                    region_id,
                    inner.options.histogram_byte_depth,
                    inner.options.stats_update_frequency,
                ) {
                    warn!("[Statistics]: scheduled run skipped region {}: {}", region_id, err);
                }
            }
        })?;
        *self.scheduler.lock() = Some((stop_tx, handle));

        Ok(())
    }

    pub fn stop_schedule(&self) {
        if let Some((stop_tx, handle)) = self.scheduler.lock().take() {
            drop(stop_tx);
            if handle.join().is_err() {
                error!("[Statistics]: scheduler panicked");
            }
        }
    }

    /// Loads persisted statistics of the regions that still exist into the
    /// cache and returns how many were loaded.
    pub fn load(&self) -> Result<usize, DatabaseError> {
        let Some(stats_dir) = self.inner.options.stats_dir.as_ref() else {
            return Ok(0);
        };
        if !stats_dir.exists() {
            return Ok(0);
        }
        let mut loaded = 0;

        for table_dir in fs::read_dir(stats_dir)? {
            let table_dir = table_dir?.path();
            if !table_dir.is_dir() {
                continue;
            }
            for (region_id, path) in region_files(&table_dir)? {
                let Some(region) = self.inner.storage.region(region_id) else {
                    continue;
                };
                let meta = StatisticsMeta::from_file(&path)?;

                if meta.table_name() == region.table_name().as_str() {
                    self.inner.cache.insert(meta.into_stats());
                    loaded += 1;
                }
            }
        }
        debug!("[Statistics]: loaded {} persisted region statistics", loaded);

        Ok(loaded)
    }

    /// Removes persisted statistics of `table_name` whose region is no longer
    /// one of `live_regions` and returns the removed paths.
    pub fn clean_expired(
        &self,
        table_name: &str,
        live_regions: &[RegionId],
    ) -> Result<Vec<PathBuf>, DatabaseError> {
        let Some(table_dir) = self.inner.table_dir(table_name) else {
            return Ok(vec![]);
        };
        if !table_dir.exists() {
            return Ok(vec![]);
        }
        let live_regions: HashSet<RegionId> = live_regions.iter().copied().collect();
        let mut removed = vec![];

        for (region_id, path) in region_files(&table_dir)? {
            if !live_regions.contains(&region_id) {
                fs::remove_file(&path)?;
                self.inner.cache.remove(region_id);
                removed.push(path);
            }
        }

        Ok(removed)
    }
}

/// Statistics files of one table directory, named by their region id.
fn region_files(table_dir: &Path) -> Result<Vec<(RegionId, PathBuf)>, DatabaseError> {
    let mut files = vec![];

    for entry in fs::read_dir(table_dir)? {
        let path = entry?.path();
        let region_id = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<RegionId>().ok());

        if let Some(region_id) = region_id {
            files.push((region_id, path));
        }
    }

    Ok(files)
}

impl<S: Storage> Drop for StatisticsCollector<S> {
    fn drop(&mut self) {
        self.stop_schedule();
        // workers drain the queue, then see the channel closed
        self.sender.take();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("[Statistics]: collector worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::catalog::TableName;
    use crate::db::DatabaseOptions;
    use crate::errors::DatabaseError;
    use crate::optimizer::core::statistics_meta::{StatisticsMeta, StatisticsMetaCache};
    use crate::statistics::collector::StatisticsCollector;
    use crate::storage::memory::{MemoryRegion, MemoryStorage};
    use crate::storage::{KeyRange, KeyValueIter, Region, RegionId, Storage};
    use crate::catalog::TableCatalog;
    use parking_lot::{Condvar, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Lets a test hold region scans until it opens the gate.
    #[derive(Default)]
    struct Gate {
        open: Mutex<bool>,
        opened: Condvar,
        scans: AtomicUsize,
    }

    impl Gate {
        fn open(&self) {
            *self.open.lock() = true;
            self.opened.notify_all();
        }

        fn pass(&self) {
            self.scans.fetch_add(1, Ordering::SeqCst);
            let mut open = self.open.lock();
            while !*open {
                self.opened.wait(&mut open);
            }
        }
    }

    struct GatedRegion {
        inner: Arc<MemoryRegion>,
        gate: Arc<Gate>,
    }

    impl Region for GatedRegion {
        fn id(&self) -> RegionId {
            self.inner.id()
        }

        fn table_name(&self) -> &TableName {
            self.inner.table_name()
        }

        fn range(&self) -> &KeyRange {
            self.inner.range()
        }

        fn scan(&self, range: &KeyRange) -> Result<KeyValueIter, DatabaseError> {
            self.gate.pass();
            self.inner.scan(range)
        }

        fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), DatabaseError> {
            self.inner.put(key, value)
        }
    }

    struct GatedStorage {
        inner: MemoryStorage,
        gate: Arc<Gate>,
    }

    impl Storage for GatedStorage {
        type RegionType = GatedRegion;

        fn create_regions(
            &self,
            table: &TableCatalog,
            ranges: Vec<KeyRange>,
        ) -> Result<Vec<RegionId>, DatabaseError> {
            self.inner.create_regions(table, ranges)
        }

        fn regions(&self, table_name: &str) -> Result<Vec<Arc<GatedRegion>>, DatabaseError> {
            Ok(self
                .inner
                .regions(table_name)?
                .into_iter()
                .map(|inner| {
                    Arc::new(GatedRegion {
                        inner,
                        gate: self.gate.clone(),
                    })
                })
                .collect())
        }

        fn region(&self, id: RegionId) -> Option<Arc<GatedRegion>> {
            self.inner.region(id).map(|inner| {
                Arc::new(GatedRegion {
                    inner,
                    gate: self.gate.clone(),
                })
            })
        }

        fn region_ids(&self) -> Vec<RegionId> {
            self.inner.region_ids()
        }
    }

    fn gated_storage(regions: usize) -> Result<(Arc<GatedStorage>, Arc<Gate>), DatabaseError> {
        let gate = Arc::new(Gate::default());
        let storage = Arc::new(GatedStorage {
            inner: MemoryStorage::new(),
            gate: gate.clone(),
        });
        storage.create_regions(
            &crate::binder::test::build_t1()?,
            (0..regions)
                .map(|i| {
                    KeyRange::new(
                        (i > 0).then(|| vec![i as u8]),
                        (i + 1 < regions).then(|| vec![i as u8 + 1]),
                    )
                })
                .collect(),
        )?;
        for i in 0..regions {
            let region = storage.inner.region(i as RegionId).unwrap();
            for j in 0..10u8 {
                region.put(vec![i as u8, j], vec![j; 30])?;
            }
        }

        Ok((storage, gate))
    }

    fn options(pool_size: usize, queue_size: usize) -> DatabaseOptions {
        DatabaseOptions {
            collector_pool_size: pool_size,
            collector_queue_size: queue_size,
            ..DatabaseOptions::default()
        }
    }

    #[test]
    fn test_collect_is_idempotent() -> Result<(), DatabaseError> {
        let (storage, gate) = gated_storage(1)?;
        gate.open();
        let cache = Arc::new(StatisticsMetaCache::default());
        let collector =
            StatisticsCollector::new(storage, cache.clone(), Arc::new(options(2, 4)))?;

        let first = collector.collect_blocking(0, 64, Duration::from_secs(60))?;
        assert!(first.scanned);
        assert_eq!(first.stats.row_count, 10);
        assert_eq!(first.stats.guideposts.len(), 5);

        let second = collector.collect_blocking(0, 64, Duration::from_secs(60))?;
        assert!(!second.scanned);
        assert!(Arc::ptr_eq(&first.stats, &second.stats));
        assert_eq!(gate.scans.load(Ordering::SeqCst), 1);

        let forced = collector.on_major_compaction(0)?.wait()?;
        assert!(forced.scanned);
        assert_eq!(gate.scans.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&cache.get(0).unwrap(), &forced.stats));

        Ok(())
    }

    #[test]
    fn test_concurrent_requests_share_one_scan() -> Result<(), DatabaseError> {
        let (storage, gate) = gated_storage(1)?;
        let collector = StatisticsCollector::new(
            storage,
            Arc::new(StatisticsMetaCache::default()),
            Arc::new(options(2, 4)),
        )?;

        let first = collector.collect(0, 64, Duration::from_secs(60))?;
        let second = collector.collect(0, 64, Duration::from_secs(60))?;
        gate.open();

        let (first, second) = (first.wait()?, second.wait()?);
        assert!(Arc::ptr_eq(&first.stats, &second.stats));
        assert_eq!(gate.scans.load(Ordering::SeqCst), 1);

        Ok(())
    }

    #[test]
    fn test_full_queue_is_backpressure() -> Result<(), DatabaseError> {
        let (storage, gate) = gated_storage(3)?;
        let collector = StatisticsCollector::new(
            storage,
            Arc::new(StatisticsMetaCache::default()),
            Arc::new(options(1, 1)),
        )?;

        // the only worker blocks on region 0, region 1 fills the queue
        let running = collector.collect(0, 64, Duration::ZERO)?;
        while gate.scans.load(Ordering::SeqCst) == 0 {
            std::thread::yield_now();
        }
        let queued = collector.collect(1, 64, Duration::ZERO)?;
        assert!(matches!(
            collector.collect(2, 64, Duration::ZERO),
            Err(DatabaseError::CollectorBackpressure(2))
        ));
        gate.open();

        assert!(running.wait()?.scanned);
        assert!(queued.wait()?.scanned);
        // a rejected region can be requested again
        assert!(collector.collect_blocking(2, 64, Duration::ZERO)?.scanned);

        Ok(())
    }

    #[test]
    fn test_missing_region_fails_alone() -> Result<(), DatabaseError> {
        let (storage, gate) = gated_storage(1)?;
        gate.open();
        let collector = StatisticsCollector::new(
            storage,
            Arc::new(StatisticsMetaCache::default()),
            Arc::new(options(1, 4)),
        )?;

        assert!(matches!(
            collector.collect_blocking(42, 64, Duration::ZERO),
            Err(DatabaseError::CollectFailed(42, _))
        ));
        assert!(collector.collect_blocking(0, 64, Duration::ZERO)?.scanned);

        Ok(())
    }

    #[test]
    fn test_persist_load_and_clean() -> Result<(), DatabaseError> {
        let temp_dir = TempDir::new().expect("unable to create temporary working directory");
        let (storage, gate) = gated_storage(2)?;
        gate.open();
        let options = Arc::new(DatabaseOptions {
            stats_dir: Some(temp_dir.path().to_path_buf()),
            ..DatabaseOptions::default()
        });

        let collector = StatisticsCollector::new(
            storage.clone(),
            Arc::new(StatisticsMetaCache::default()),
            options.clone(),
        )?;
        let collected = collector.collect_blocking(1, 64, Duration::ZERO)?;
        let path = temp_dir.path().join("t1").join("1");
        assert_eq!(StatisticsMeta::from_file(&path)?.stats(), collected.stats.as_ref());
        drop(collector);

        let cache = Arc::new(StatisticsMetaCache::default());
        let collector = StatisticsCollector::new(storage, cache.clone(), options)?;
        assert_eq!(collector.load()?, 1);
        assert_eq!(cache.get(1).as_deref(), Some(collected.stats.as_ref()));

        let removed = collector.clean_expired("t1", &[0])?;
        assert_eq!(removed, vec![path.clone()]);
        assert!(!path.exists());
        assert!(cache.get(1).is_none());

        Ok(())
    }

    #[test]
    fn test_schedule() -> Result<(), DatabaseError> {
        let (storage, gate) = gated_storage(2)?;
        gate.open();
        let cache = Arc::new(StatisticsMetaCache::default());
        let collector = StatisticsCollector::new(storage, cache.clone(), Arc::new(options(2, 4)))?;

        collector.schedule(Duration::from_millis(10))?;
        for _ in 0..500 {
            if cache.len() == 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        collector.stop_schedule();
        assert_eq!(cache.len(), 2);

        Ok(())
    }
}
