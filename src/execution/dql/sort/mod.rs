pub mod comparator;
pub(crate) mod merge;
pub(crate) mod spill;

use crate::errors::DatabaseError;
use crate::execution::dql::filter::Filter;
use crate::execution::dql::sort::comparator::{compare_keys, sort_keys, KeyValidator};
use crate::execution::dql::sort::merge::{KeyedStream, KeyedTuple, MergingIter};
use crate::execution::dql::sort::spill::SpillSegment;
use crate::execution::dql::table_scan::TableScan;
use crate::execution::{build_read, BoxedExecutor, QueryContext, ReadExecutor};
use crate::optimizer::core::ordering::Ordering;
use crate::planner::operator::sort::{SortField, SortOperator};
use crate::planner::operator::Operator;
use crate::planner::LogicalPlan;
use crate::storage::Storage;
use crate::types::tuple::SchemaRef;
use itertools::{Either, Itertools};
use log::{debug, info};
use std::iter;
use std::mem;
use std::sync::Arc;

pub struct Sort {
    sort_fields: Vec<SortField>,
    limit: Option<usize>,
    input: LogicalPlan,
}

impl From<(SortOperator, LogicalPlan)> for Sort {
    fn from((SortOperator { sort_fields, limit }, input): (SortOperator, LogicalPlan)) -> Self {
        Sort {
            sort_fields,
            limit,
            input,
        }
    }
}

impl<S: Storage> ReadExecutor<S> for Sort {
    fn execute(self, ctx: &QueryContext<S>) -> BoxedExecutor {
        let ctx = ctx.clone();
        let limit = self.limit;

        let rows = iter::once_with(move || self.sorted(&ctx)).flat_map(|result| match result {
            Ok(rows) => Either::Left(rows),
            Err(err) => Either::Right(iter::once(Err(err))),
        });
        match limit {
            Some(limit) => Box::new(rows.take(limit)),
            None => Box::new(rows),
        }
    }
}

impl Sort {
    fn sorted<S: Storage>(self, ctx: &QueryContext<S>) -> Result<BoxedExecutor, DatabaseError> {
        let Sort {
            sort_fields,
            limit,
            input,
        } = self;
        let schema = input.output_schema();
        let fields: Arc<[SortField]> = sort_fields.into();

        let merge_regions = Ordering::of_partitions(&input)
            .map(|ordering| ordering.satisfies(&fields))
            .unwrap_or(false);
        if merge_regions {
            let streams = partition_streams(input, ctx)?
                .into_iter()
                .map(|stream| keyed(stream, fields.clone(), schema.clone()))
                .collect_vec();
            info!("[Sort]: merging {} ordered region streams", streams.len());

            return Ok(Box::new(MergingIter::new(
                streams,
                fields,
                ctx.cancel.clone(),
            )));
        }

        external_sort(build_read(input, ctx), fields, schema, limit, ctx)
    }
}

/// Per-region streams of a plan that reads regions directly.
fn partition_streams<S: Storage>(
    mut plan: LogicalPlan,
    ctx: &QueryContext<S>,
) -> Result<Vec<BoxedExecutor>, DatabaseError> {
    let child = plan.take_child();

    match (plan.operator, child) {
        (Operator::TableScan(op), _) => TableScan::from(op).partition_streams(ctx),
        (Operator::Filter(op), Some(child)) => {
            let schema = child.output_schema();

            Ok(partition_streams(child, ctx)?
                .into_iter()
                .map(|stream| Filter::from((op.clone(), schema.clone(), stream))._execute())
                .collect_vec())
        }
        (operator, _) => Err(DatabaseError::InvalidValue(format!(
            "`{}` does not read regions",
            operator
        ))),
    }
}

fn keyed(stream: BoxedExecutor, fields: Arc<[SortField]>, schema: SchemaRef) -> KeyedStream {
    Box::new(stream.map(move |tuple| {
        let tuple = tuple?;

        Ok((sort_keys(&tuple, &fields, &schema)?, tuple))
    }))
}

fn estimated_size((keys, tuple): &KeyedTuple) -> usize {
    keys.iter().map(|key| key.estimated_size()).sum::<usize>() + tuple.estimated_size()
}

/// Sorts runs of at most `sort_memory_budget` bytes, spilling every full run,
/// and merges the spilled runs with the last one kept in memory.
fn external_sort<S: Storage>(
    input: BoxedExecutor,
    fields: Arc<[SortField]>,
    schema: SchemaRef,
    limit: Option<usize>,
    ctx: &QueryContext<S>,
) -> Result<BoxedExecutor, DatabaseError> {
    let budget = ctx.options.sort_memory_budget;
    let mut validator = KeyValidator::default();
    let mut buffer: Vec<KeyedTuple> = vec![];
    let mut buffered = 0;
    let mut segments = vec![];

    let sort_run = |buffer: &mut Vec<KeyedTuple>| {
        buffer.sort_by(|(a, _), (b, _)| compare_keys(a, b, &fields));
        // rows past the limit of a run can never be emitted
        if let Some(limit) = limit {
            buffer.truncate(limit);
        }
    };

    for tuple in input {
        let tuple = tuple?;
        ctx.cancel.check()?;
        let row = (sort_keys(&tuple, &fields, schema.as_slice())?, tuple);
        validator.validate(&row.0)?;

        buffered += estimated_size(&row);
        buffer.push(row);

        if buffered > budget {
            sort_run(&mut buffer);
            segments.push(SpillSegment::write(
                mem::take(&mut buffer),
                &ctx.options.spill_path,
            )?);
            buffered = 0;
        }
    }
    sort_run(&mut buffer);

    if segments.is_empty() {
        debug!("[Sort]: sorted {} rows in memory", buffer.len());
        return Ok(Box::new(buffer.into_iter().map(|(_, tuple)| Ok(tuple))));
    }
    info!(
        "[Sort]: merging {} spilled rows in {} segments with {} buffered rows",
        segments.iter().map(SpillSegment::len).sum::<usize>(),
        segments.len(),
        buffer.len()
    );
    let mut streams = segments
        .into_iter()
        .map(|segment| Ok(Box::new(segment.into_reader()?) as KeyedStream))
        .collect::<Result<Vec<_>, DatabaseError>>()?;
    streams.push(Box::new(buffer.into_iter().map(Ok)));

    let merged = MergingIter::new(streams, fields, ctx.cancel.clone());

    Ok(match limit {
        Some(limit) => Box::new(merged.take(limit)),
        None => Box::new(merged),
    })
}
