use crate::errors::DatabaseError;
use crate::execution::dql::aggregate::{create_accumulators, Accumulator};
use crate::execution::dql::sort::comparator::{compare_keys, KeyValidator};
use crate::execution::{BoxedExecutor, QueryContext, ReadExecutor};
use crate::expression::ScalarExpression;
use crate::planner::operator::aggregate::AggregateOperator;
use crate::planner::operator::sort::SortField;
use crate::storage::Storage;
use crate::types::tuple::{SchemaRef, Tuple};
use crate::types::value::{DataValue, ValueRef};
use ahash::HashMap;
use itertools::{Either, Itertools};
use log::debug;
use std::collections::hash_map::Entry;
use std::iter;
use std::sync::Arc;

pub struct HashAggExecutor {
    agg_calls: Vec<ScalarExpression>,
    groupby_exprs: Vec<ScalarExpression>,
    schema: SchemaRef,
    input: BoxedExecutor,
}

impl From<(AggregateOperator, SchemaRef, BoxedExecutor)> for HashAggExecutor {
    fn from(
        (
            AggregateOperator {
                agg_calls,
                groupby_exprs,
                ..
            },
            schema,
            input,
        ): (AggregateOperator, SchemaRef, BoxedExecutor),
    ) -> Self {
        HashAggExecutor {
            agg_calls,
            groupby_exprs,
            schema,
            input,
        }
    }
}

impl<S: Storage> ReadExecutor<S> for HashAggExecutor {
    fn execute(self, _ctx: &QueryContext<S>) -> BoxedExecutor {
        self._execute()
    }
}

impl HashAggExecutor {
    pub(crate) fn _execute(self) -> BoxedExecutor {
        Box::new(
            iter::once_with(move || self.aggregate()).flat_map(|result| match result {
                Ok(tuples) => Either::Left(tuples.into_iter().map(Ok)),
                Err(err) => Either::Right(iter::once(Err(err))),
            }),
        )
    }

    fn aggregate(self) -> Result<Vec<Tuple>, DatabaseError> {
        let HashAggExecutor {
            agg_calls,
            groupby_exprs,
            schema,
            input,
        } = self;
        let mut status = HashAggStatus::new(schema, agg_calls, groupby_exprs);

        for tuple in input {
            status.update(tuple?)?;
        }
        status.into_tuples()
    }
}

pub(crate) struct HashAggStatus {
    schema_ref: SchemaRef,

    agg_calls: Vec<ScalarExpression>,
    groupby_exprs: Vec<ScalarExpression>,

    /// Stands in for the argument of `count(*)`
    star: ValueRef,
    validator: KeyValidator,
    group_hash_accs: HashMap<Vec<ValueRef>, Vec<Box<dyn Accumulator>>>,
}

impl HashAggStatus {
    pub(crate) fn new(
        schema_ref: SchemaRef,
        agg_calls: Vec<ScalarExpression>,
        groupby_exprs: Vec<ScalarExpression>,
    ) -> Self {
        HashAggStatus {
            schema_ref,
            agg_calls,
            groupby_exprs,
            star: Arc::new(DataValue::Boolean(Some(true))),
            validator: KeyValidator::default(),
            group_hash_accs: Default::default(),
        }
    }

    pub(crate) fn update(&mut self, tuple: Tuple) -> Result<(), DatabaseError> {
        // 1. evaluate agg exprs and collect the result values for later accumulators.
        let values: Vec<ValueRef> = self
            .agg_calls
            .iter()
            .map(|expr| match expr {
                ScalarExpression::AggCall { args, .. } => match args.first() {
                    Some(arg) => arg.eval(&tuple, &self.schema_ref),
                    None => Ok(self.star.clone()),
                },
                expr => Err(DatabaseError::AggMiss(expr.to_string())),
            })
            .try_collect()?;

        let group_keys: Vec<ValueRef> = self
            .groupby_exprs
            .iter()
            .map(|expr| expr.eval(&tuple, &self.schema_ref))
            .try_collect()?;
        // groups are ordered on output
        self.validator.validate(&group_keys)?;

        let accs = match self.group_hash_accs.entry(group_keys) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(create_accumulators(&self.agg_calls)?),
        };
        for (acc, value) in accs.iter_mut().zip_eq(values.iter()) {
            acc.update_value(value)?;
        }

        Ok(())
    }

    /// One tuple per group, aggregate values first, ordered by the group keys
    /// ascending with nulls last.
    pub(crate) fn into_tuples(self) -> Result<Vec<Tuple>, DatabaseError> {
        let HashAggStatus {
            agg_calls,
            groupby_exprs,
            mut group_hash_accs,
            ..
        } = self;

        // without GROUP BY an empty input still has its single group
        if groupby_exprs.is_empty() && group_hash_accs.is_empty() {
            group_hash_accs.insert(vec![], create_accumulators(&agg_calls)?);
        }
        let fields = groupby_exprs
            .iter()
            .map(|expr| SortField::with_default_nulls(expr.clone(), true))
            .collect_vec();
        let mut groups = group_hash_accs.into_iter().collect_vec();
        groups.sort_by(|(a, _), (b, _)| compare_keys(a, b, &fields));
        debug!("[Aggregate]: {} group(s)", groups.len());

        groups
            .into_iter()
            .map(|(group_keys, accs)| {
                // Tips: Accumulator First
                let values: Vec<ValueRef> = accs
                    .iter()
                    .map(|acc| acc.evaluate())
                    .chain(group_keys.into_iter().map(Ok))
                    .try_collect()?;

                Ok(Tuple::new(None, values))
            })
            .try_collect()
    }
}

#[cfg(test)]
mod test {
    use crate::errors::DatabaseError;
    use crate::execution::dql::aggregate::hash_agg::HashAggExecutor;
    use crate::execution::dql::test::{collect, executor, int_column, int_rows, ints};
    use crate::expression::agg::AggKind;
    use crate::expression::ScalarExpression;
    use crate::planner::operator::aggregate::AggregateOperator;
    use crate::types::value::DataValue;
    use crate::types::LogicalType;
    use std::sync::Arc;

    fn agg(kind: AggKind, args: Vec<ScalarExpression>, ty: LogicalType) -> ScalarExpression {
        ScalarExpression::AggCall {
            distinct: false,
            kind,
            args,
            ty,
        }
    }

    #[test]
    fn test_hash_agg_groups_in_key_order() -> Result<(), DatabaseError> {
        let (a, b) = (int_column("a"), int_column("b"));
        let operator = AggregateOperator {
            groupby_exprs: vec![ScalarExpression::ColumnRef(a.clone())],
            agg_calls: vec![
                agg(AggKind::Count, vec![], LogicalType::Bigint),
                agg(
                    AggKind::Sum,
                    vec![ScalarExpression::ColumnRef(b.clone())],
                    LogicalType::Bigint,
                ),
                agg(
                    AggKind::Max,
                    vec![ScalarExpression::ColumnRef(b.clone())],
                    LogicalType::Integer,
                ),
            ],
            is_distinct: false,
        };
        let rows = int_rows(&[
            &[Some(3), Some(1)],
            &[None, Some(5)],
            &[Some(1), None],
            &[Some(3), Some(2)],
            &[Some(1), Some(4)],
            &[None, None],
        ]);
        let tuples = collect(
            HashAggExecutor::from((operator, Arc::new(vec![a, b]), executor(rows)))._execute(),
        )?;

        assert_eq!(
            ints(tuples),
            vec![
                vec![Some(2), Some(4), Some(4), Some(1)],
                vec![Some(2), Some(3), Some(2), Some(3)],
                vec![Some(2), Some(5), Some(5), None],
            ]
        );

        Ok(())
    }

    #[test]
    fn test_simple_agg_on_empty_input() -> Result<(), DatabaseError> {
        let a = int_column("a");
        let operator = AggregateOperator {
            groupby_exprs: vec![],
            agg_calls: vec![
                agg(AggKind::Count, vec![], LogicalType::Bigint),
                agg(
                    AggKind::Min,
                    vec![ScalarExpression::ColumnRef(a.clone())],
                    LogicalType::Integer,
                ),
            ],
            is_distinct: false,
        };
        let tuples = collect(
            HashAggExecutor::from((operator, Arc::new(vec![a]), executor(vec![])))._execute(),
        )?;

        assert_eq!(tuples.len(), 1);
        assert_eq!(*tuples[0].values[0], DataValue::Int64(Some(0)));
        assert!(tuples[0].values[1].is_null());

        Ok(())
    }

    #[test]
    fn test_distinct_groups() -> Result<(), DatabaseError> {
        let a = int_column("a");
        let operator = AggregateOperator {
            groupby_exprs: vec![ScalarExpression::ColumnRef(a.clone())],
            agg_calls: vec![],
            is_distinct: true,
        };
        let rows = int_rows(&[&[Some(2)], &[None], &[Some(2)], &[Some(1)]]);
        let tuples = collect(
            HashAggExecutor::from((operator, Arc::new(vec![a]), executor(rows)))._execute(),
        )?;

        assert_eq!(ints(tuples), vec![vec![Some(1)], vec![Some(2)], vec![None]]);

        Ok(())
    }
}
