use crate::binder::{Binder, BinderContext};
use crate::catalog::TableCatalog;
use crate::errors::DatabaseError;
use crate::execution::dml::analyze::{Analyze, AnalyzeReport};
use crate::execution::{build_read, try_collect, BoxedExecutor, QueryContext};
use crate::optimizer::core::statistics_meta::StatisticsMetaCache;
use crate::optimizer::heuristic::batch::HepBatchStrategy;
use crate::optimizer::heuristic::optimizer::HepOptimizer;
use crate::optimizer::rule::normalization::NormalizationRuleImpl;
use crate::parser::Select;
use crate::planner::LogicalPlan;
use crate::statistics::StatisticsCollector;
use crate::storage::memory::MemoryStorage;
use crate::storage::table_codec::TableCodec;
use crate::storage::{Region, Storage};
use crate::types::tuple::{SchemaRef, Tuple};
use crate::types::value::DataValue;
use crate::utils::thread::CancellationToken;
use ahash::HashMap;
use log::debug;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Tuning of sorting, scanning and statistics collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Bytes between two guideposts
    pub histogram_byte_depth: u64,
    /// Statistics younger than this are not collected again
    pub stats_update_frequency: Duration,
    pub collector_pool_size: usize,
    pub collector_queue_size: usize,
    /// Bytes of rows a sort buffers before spilling a run
    pub sort_memory_budget: usize,
    pub spill_path: PathBuf,
    /// Where collected statistics are persisted, nowhere when `None`
    pub stats_dir: Option<PathBuf>,
    /// Period of the background collection of every region, off when `None`
    pub stats_scheduler_interval: Option<Duration>,
    /// Rows a scan task reads ahead of its consumer
    pub scan_buffer_size: usize,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        DatabaseOptions {
            histogram_byte_depth: 64 * 1024,
            stats_update_frequency: Duration::from_secs(15 * 60),
            collector_pool_size: 4,
            collector_queue_size: 64,
            sort_memory_budget: 64 * 1024 * 1024,
            spill_path: std::env::temp_dir(),
            stats_dir: None,
            stats_scheduler_interval: None,
            scan_buffer_size: 128,
        }
    }
}

#[derive(Default)]
pub struct DataBaseBuilder {
    options: DatabaseOptions,
}

impl DataBaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DatabaseOptions) -> Self {
        DataBaseBuilder { options }
    }

    pub fn histogram_byte_depth(mut self, byte_depth: u64) -> Self {
        self.options.histogram_byte_depth = byte_depth;
        self
    }

    pub fn stats_update_frequency(mut self, frequency: Duration) -> Self {
        self.options.stats_update_frequency = frequency;
        self
    }

    pub fn collector_pool_size(mut self, pool_size: usize) -> Self {
        self.options.collector_pool_size = pool_size;
        self
    }

    pub fn collector_queue_size(mut self, queue_size: usize) -> Self {
        self.options.collector_queue_size = queue_size;
        self
    }

    pub fn sort_memory_budget(mut self, budget: usize) -> Self {
        self.options.sort_memory_budget = budget;
        self
    }

    pub fn spill_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.spill_path = path.into();
        self
    }

    pub fn stats_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.stats_dir = Some(path.into());
        self
    }

    pub fn stats_scheduler_interval(mut self, interval: Duration) -> Self {
        self.options.stats_scheduler_interval = Some(interval);
        self
    }

    pub fn scan_buffer_size(mut self, buffer_size: usize) -> Self {
        self.options.scan_buffer_size = buffer_size;
        self
    }

    pub fn build(self) -> Result<Database<MemoryStorage>, DatabaseError> {
        self.build_with_storage(MemoryStorage::new())
    }

    pub fn build_with_storage<S: Storage>(self, storage: S) -> Result<Database<S>, DatabaseError> {
        let storage = Arc::new(storage);
        let statistics = Arc::new(StatisticsMetaCache::default());
        let options = Arc::new(self.options);
        let collector =
            StatisticsCollector::new(storage.clone(), statistics.clone(), options.clone())?;

        collector.load()?;
        if let Some(interval) = options.stats_scheduler_interval {
            collector.schedule(interval)?;
        }

        Ok(Database {
            storage,
            tables: RwLock::new(HashMap::default()),
            statistics,
            collector,
            options,
        })
    }
}

pub struct Database<S: Storage> {
    storage: Arc<S>,
    tables: RwLock<HashMap<String, Arc<TableCatalog>>>,
    statistics: Arc<StatisticsMetaCache>,
    collector: StatisticsCollector<S>,
    options: Arc<DatabaseOptions>,
}

impl<S: Storage> Database<S> {
    /// Registers the table and creates its regions.
    pub fn create_table(&self, table: TableCatalog) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write();

        if tables.contains_key(table.name().as_str()) {
            return Err(DatabaseError::DuplicateTable(table.name().to_string()));
        }
        let ranges = TableCodec::new(&table).region_ranges()?;
        self.storage.create_regions(&table, ranges)?;
        tables.insert(table.name().to_string(), Arc::new(table));

        Ok(())
    }

    pub fn table(&self, table_name: &str) -> Option<Arc<TableCatalog>> {
        self.tables.read().get(table_name).cloned()
    }

    /// Writes rows given in column order into the regions owning their keys.
    pub fn insert(
        &self,
        table_name: &str,
        rows: Vec<Vec<DataValue>>,
    ) -> Result<usize, DatabaseError> {
        let table = self
            .table(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound(table_name.to_string()))?;
        let codec = TableCodec::new(&table);
        let regions = self.storage.regions(table_name)?;
        let mut inserted = 0;

        for row in rows {
            if row.len() != table.columns_len() {
                return Err(DatabaseError::MisMatch(table.columns_len(), row.len()));
            }
            let values = row
                .into_iter()
                .zip(table.columns())
                .map(|(value, column)| {
                    let value = value.cast(column.datatype())?;

                    if value.is_null() && !column.nullable {
                        return Err(DatabaseError::InvalidValue(format!(
                            "column {} can not be null",
                            column.name
                        )));
                    }
                    Ok(Arc::new(value))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let (key, value) = codec.encode_tuple(&Tuple::new(None, values))?;
            let region = regions
                .iter()
                .find(|region| region.range().contains(&key))
                .ok_or_else(|| {
                    DatabaseError::InvalidValue(format!("no region of {} owns {:?}", table_name, key))
                })?;

            region.put(key, value)?;
            inserted += 1;
        }

        Ok(inserted)
    }

    /// Binds and optimizes `select`; the plan's Display shows whether the
    /// sort survived.
    pub fn plan(&self, select: &Select) -> Result<LogicalPlan, DatabaseError> {
        let table = self
            .table(select.table_name())
            .ok_or_else(|| DatabaseError::TableNotFound(select.table_name().to_string()))?;
        /// Build a logical plan.
        ///
        /// SELECT a, b FROM t1 ORDER BY a LIMIT 1;
        /// Limit(1)
        ///   Project(a, b)
        ///     Sort(a)
        ///       Scan(t1)
        let source_plan = Binder::new(BinderContext::new(&table)).bind(select)?;
        let best_plan = Self::default_optimizer(source_plan).find_best()?;
        debug!("[Database]: plan of {}\n{}", select.table_name(), best_plan);

        Ok(best_plan)
    }

    pub(crate) fn default_optimizer(source_plan: LogicalPlan) -> HepOptimizer {
        HepOptimizer::new(source_plan)
            .batch(
                "Limit Pushdown".to_string(),
                HepBatchStrategy::fix_point_topdown(10),
                vec![NormalizationRuleImpl::PushLimitIntoSort],
            )
            .batch(
                "Order Elimination".to_string(),
                HepBatchStrategy::fix_point_topdown(10),
                vec![NormalizationRuleImpl::EliminateRedundantSort],
            )
    }

    pub(crate) fn query_context(&self, cancel: CancellationToken) -> QueryContext<S> {
        QueryContext {
            storage: self.storage.clone(),
            statistics: self.statistics.clone(),
            options: self.options.clone(),
            cancel,
        }
    }

    /// Streams the rows of `select`; `cancel` stops its scans and sorts.
    pub fn execute(
        &self,
        select: &Select,
        cancel: CancellationToken,
    ) -> Result<(SchemaRef, BoxedExecutor), DatabaseError> {
        let plan = self.plan(select)?;
        let schema = plan.output_schema();

        Ok((schema, build_read(plan, &self.query_context(cancel))))
    }

    pub fn run(&self, select: &Select) -> Result<(SchemaRef, Vec<Tuple>), DatabaseError> {
        let (schema, executor) = self.execute(select, CancellationToken::new())?;

        Ok((schema, try_collect(executor)?))
    }

    /// `ANALYZE <table>`: collects the statistics of every region of the table.
    pub fn analyze(&self, table_name: &str) -> Result<AnalyzeReport, DatabaseError> {
        let table = self
            .table(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound(table_name.to_string()))?;

        Analyze::new(table.name().clone()).execute(self.storage.as_ref(), &self.collector)
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn statistics(&self) -> &Arc<StatisticsMetaCache> {
        &self.statistics
    }

    pub fn collector(&self) -> &StatisticsCollector<S> {
        &self.collector
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }
}
