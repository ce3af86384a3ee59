use crate::errors::DatabaseError;
use crate::execution::{throw, BoxedExecutor, QueryContext, ReadExecutor};
use crate::optimizer::core::statistics_meta::PartitionStats;
use crate::planner::operator::table_scan::TableScanOperator;
use crate::statistics::now_millis;
use crate::storage::table_codec::TableCodec;
use crate::storage::{KeyRange, Region, Storage};
use crate::types::tuple::Tuple;
use crate::types::LogicalType;
use crate::utils::thread::{named_spawn, panic_message, CancellationToken};
use itertools::Itertools;
use log::debug;
use std::collections::VecDeque;
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Upper bound of scan tasks one region is cut into.
pub(crate) const MAX_TASKS_PER_REGION: usize = 16;

pub struct TableScan {
    op: TableScanOperator,
}

impl From<TableScanOperator> for TableScan {
    fn from(op: TableScanOperator) -> Self {
        TableScan { op }
    }
}

impl<S: Storage> ReadExecutor<S> for TableScan {
    fn execute(self, ctx: &QueryContext<S>) -> BoxedExecutor {
        match self.region_streams(ctx) {
            Ok(streams) => Box::new(streams.into_iter().flatten()),
            Err(err) => throw(err),
        }
    }
}

impl TableScan {
    /// One stream per region in key order, each yielding its rows in row key
    /// order.
    pub(crate) fn partition_streams<S: Storage>(
        self,
        ctx: &QueryContext<S>,
    ) -> Result<Vec<BoxedExecutor>, DatabaseError> {
        Ok(self
            .region_streams(ctx)?
            .into_iter()
            .map(|stream| Box::new(stream) as BoxedExecutor)
            .collect_vec())
    }

    fn region_streams<S: Storage>(
        self,
        ctx: &QueryContext<S>,
    ) -> Result<Vec<ScanStream>, DatabaseError> {
        let TableScanOperator {
            table_name,
            columns,
            ..
        } = self.op;
        let types: Arc<[LogicalType]> = columns.iter().map(|column| *column.datatype()).collect();
        let regions = ctx.storage.regions(&table_name)?;
        let mut streams = Vec::with_capacity(regions.len());

        for region in regions {
            let ranges = scan_ranges(region.as_ref(), ctx.statistics.get(region.id()), ctx);
            debug!(
                "[TableScan]: region {} of {} scanned by {} task(s)",
                region.id(),
                table_name,
                ranges.len()
            );
            let mut tasks = VecDeque::with_capacity(ranges.len());

            for (i, range) in ranges.into_iter().enumerate() {
                tasks.push_back(spawn_task(
                    format!("scan-{}-{}", region.id(), i),
                    region.clone(),
                    range,
                    types.clone(),
                    ctx,
                )?);
            }
            streams.push(ScanStream {
                tasks,
                cancel: ctx.cancel.clone(),
                finished: false,
            });
        }

        Ok(streams)
    }
}

/// Sub-ranges of `region` cut at its guideposts.
///
/// Without statistics, or with statistics older than the update frequency,
/// the region is a single task.
fn scan_ranges<R: Region, S: Storage>(
    region: &R,
    stats: Option<Arc<PartitionStats>>,
    ctx: &QueryContext<S>,
) -> Vec<KeyRange> {
    let max_age = ctx.options.stats_update_frequency.as_millis() as i64;
    let Some(stats) = stats.filter(|stats| stats.is_fresh(now_millis(), max_age)) else {
        return vec![region.range().clone()];
    };
    let split_keys = stats.split_keys();
    let step = split_keys.len().div_ceil(MAX_TASKS_PER_REGION - 1).max(1);
    let split_keys = split_keys.into_iter().step_by(step).collect_vec();

    region.range().split_at(&split_keys)
}

fn spawn_task<R: Region, S: Storage>(
    name: String,
    region: Arc<R>,
    range: KeyRange,
    types: Arc<[LogicalType]>,
    ctx: &QueryContext<S>,
) -> Result<(Receiver<Result<Tuple, DatabaseError>>, JoinHandle<()>), DatabaseError> {
    let (tx, rx) = sync_channel(ctx.options.scan_buffer_size.max(1));
    let cancel = ctx.cancel.clone();

    let handle = named_spawn(name, move || {
        let iter = match region.scan(&range) {
            Ok(iter) => iter,
            Err(err) => {
                let _ = tx.send(Err(err));
                return;
            }
        };
        for (key, value) in iter {
            if cancel.is_cancelled() {
                return;
            }
            let tuple = TableCodec::decode_tuple(&types, key, &value);
            let failed = tuple.is_err();

            // the consumer hung up
            if tx.send(tuple).is_err() || failed {
                return;
            }
        }
    })?;

    Ok((rx, handle))
}

/// Rows of one region, drained task by task in range order.
pub(crate) struct ScanStream {
    tasks: VecDeque<(Receiver<Result<Tuple, DatabaseError>>, JoinHandle<()>)>,
    cancel: CancellationToken,
    finished: bool,
}

impl Iterator for ScanStream {
    type Item = Result<Tuple, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if let Err(err) = self.cancel.check() {
                self.finished = true;
                return Some(Err(err));
            }
            let (receiver, _) = self.tasks.front()?;

            match receiver.recv() {
                Ok(Ok(tuple)) => return Some(Ok(tuple)),
                Ok(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err));
                }
                Err(_) => {
                    // the task is done once its sender is gone
                    let Some((_, handle)) = self.tasks.pop_front() else {
                        return None;
                    };
                    if let Err(payload) = handle.join() {
                        self.finished = true;
                        return Some(Err(DatabaseError::ThreadPanic(panic_message(payload))));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::db::{DataBaseBuilder, Database};
    use crate::errors::DatabaseError;
    use crate::execution::dql::table_scan::{scan_ranges, TableScan, MAX_TASKS_PER_REGION};
    use crate::execution::try_collect;
    use crate::execution::ReadExecutor;
    use crate::optimizer::core::histogram::GuidepostBuilder;
    use crate::planner::operator::table_scan::TableScanOperator;
    use crate::planner::operator::Operator;
    use crate::statistics::now_millis;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{Region, Storage};
    use crate::types::value::DataValue;
    use crate::utils::thread::CancellationToken;
    use itertools::Itertools;

    fn build_db() -> Result<Database<MemoryStorage>, DatabaseError> {
        let db = DataBaseBuilder::new().scan_buffer_size(4).build()?;
        db.create_table(crate::binder::test::build_t1()?)?;
        db.insert(
            "t1",
            (0..100)
                .map(|i| {
                    vec![
                        DataValue::Int32(Some(99 - i)),
                        DataValue::from("k"),
                        DataValue::Int32(Some(i)),
                        DataValue::Int32(None),
                        DataValue::Int64(None),
                    ]
                })
                .collect_vec(),
        )?;
        Ok(db)
    }

    fn scan_operator(db: &Database<MemoryStorage>) -> Result<TableScanOperator, DatabaseError> {
        let table = db
            .table("t1")
            .ok_or_else(|| DatabaseError::TableNotFound("t1".to_string()))?;
        match TableScanOperator::build(&table).operator {
            Operator::TableScan(op) => Ok(op),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_scan_with_guideposts_keeps_key_order() -> Result<(), DatabaseError> {
        let db = build_db()?;
        let region = db.storage().regions("t1")?.pop().unwrap();

        let mut builder = GuidepostBuilder::new(region.id(), 64);
        for (key, value) in region.scan(region.range())? {
            builder.append(&key, &value);
        }
        db.statistics().insert(builder.build(now_millis()));

        let ctx = db.query_context(CancellationToken::new());
        let ranges = scan_ranges(region.as_ref(), db.statistics().get(region.id()), &ctx);
        assert!(ranges.len() > 1 && ranges.len() <= MAX_TASKS_PER_REGION);

        let tuples = try_collect(TableScan::from(scan_operator(&db)?).execute(&ctx))?;
        let k1 = tuples.iter().map(|tuple| tuple.values[0].to_string()).collect_vec();
        assert_eq!(k1, (0..100).map(|i| i.to_string()).collect_vec());

        Ok(())
    }

    #[test]
    fn test_stale_stats_single_task() -> Result<(), DatabaseError> {
        let db = build_db()?;
        let region = db.storage().regions("t1")?.pop().unwrap();

        let mut builder = GuidepostBuilder::new(region.id(), 64);
        for (key, value) in region.scan(region.range())? {
            builder.append(&key, &value);
        }
        db.statistics().insert(builder.build(0));

        let ctx = db.query_context(CancellationToken::new());
        let ranges = scan_ranges(region.as_ref(), db.statistics().get(region.id()), &ctx);
        assert_eq!(ranges, vec![region.range().clone()]);

        Ok(())
    }

    #[test]
    fn test_cancelled_scan() -> Result<(), DatabaseError> {
        let db = build_db()?;
        let cancel = CancellationToken::new();
        let ctx = db.query_context(cancel.clone());

        let mut stream = TableScan::from(scan_operator(&db)?).execute(&ctx);
        assert!(matches!(stream.next(), Some(Ok(_))));
        cancel.cancel();
        assert!(matches!(stream.next(), Some(Err(DatabaseError::Cancelled))));
        assert!(stream.next().is_none());

        Ok(())
    }
}
