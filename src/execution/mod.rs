pub mod dml;
pub(crate) mod dql;

use crate::db::DatabaseOptions;
use crate::errors::DatabaseError;
use crate::execution::dql::aggregate::hash_agg::HashAggExecutor;
use crate::execution::dql::filter::Filter;
use crate::execution::dql::limit::Limit;
use crate::execution::dql::projection::Projection;
use crate::execution::dql::sort::Sort;
use crate::execution::dql::table_scan::TableScan;
use crate::optimizer::core::statistics_meta::StatisticsMetaCache;
use crate::planner::operator::Operator;
use crate::planner::LogicalPlan;
use crate::storage::Storage;
use crate::types::tuple::Tuple;
use crate::utils::thread::CancellationToken;
use std::iter;
use std::sync::Arc;

pub type BoxedExecutor = Box<dyn Iterator<Item = Result<Tuple, DatabaseError>>>;

/// Everything one query's executors share.
pub struct QueryContext<S: Storage> {
    pub(crate) storage: Arc<S>,
    pub(crate) statistics: Arc<StatisticsMetaCache>,
    pub(crate) options: Arc<DatabaseOptions>,
    pub(crate) cancel: CancellationToken,
}

impl<S: Storage> Clone for QueryContext<S> {
    fn clone(&self) -> Self {
        QueryContext {
            storage: self.storage.clone(),
            statistics: self.statistics.clone(),
            options: self.options.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

pub trait ReadExecutor<S: Storage> {
    fn execute(self, ctx: &QueryContext<S>) -> BoxedExecutor;
}

pub fn build_read<S: Storage>(mut plan: LogicalPlan, ctx: &QueryContext<S>) -> BoxedExecutor {
    let input = plan.take_child();
    let LogicalPlan { operator, .. } = plan;

    match (operator, input) {
        (Operator::TableScan(op), _) => TableScan::from(op).execute(ctx),
        (Operator::Aggregate(op), Some(input)) => {
            let schema = input.output_schema();
            let input = build_read(input, ctx);

            HashAggExecutor::from((op, schema, input)).execute(ctx)
        }
        (Operator::Filter(op), Some(input)) => {
            let schema = input.output_schema();
            let input = build_read(input, ctx);

            Filter::from((op, schema, input)).execute(ctx)
        }
        (Operator::Project(op), Some(input)) => {
            let schema = input.output_schema();
            let input = build_read(input, ctx);

            Projection::from((op, schema, input)).execute(ctx)
        }
        // reads region streams itself when it can merge them
        (Operator::Sort(op), Some(input)) => Sort::from((op, input)).execute(ctx),
        (Operator::Limit(op), Some(input)) => {
            let input = build_read(input, ctx);

            Limit::from((op, input)).execute(ctx)
        }
        (operator, None) => throw(DatabaseError::InvalidValue(format!(
            "operator without input: {}",
            operator
        ))),
    }
}

/// An executor that only reports `err`.
pub(crate) fn throw(err: DatabaseError) -> BoxedExecutor {
    Box::new(iter::once(Err(err)))
}

pub fn try_collect(executor: BoxedExecutor) -> Result<Vec<Tuple>, DatabaseError> {
    executor.collect()
}
