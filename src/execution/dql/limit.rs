use crate::execution::{BoxedExecutor, QueryContext, ReadExecutor};
use crate::planner::operator::limit::LimitOperator;
use crate::storage::Storage;
use std::iter;

pub struct Limit {
    offset: Option<usize>,
    limit: Option<usize>,
    input: BoxedExecutor,
}

impl From<(LimitOperator, BoxedExecutor)> for Limit {
    fn from((LimitOperator { offset, limit }, input): (LimitOperator, BoxedExecutor)) -> Self {
        Limit {
            offset,
            limit,
            input,
        }
    }
}

impl<S: Storage> ReadExecutor<S> for Limit {
    fn execute(self, _ctx: &QueryContext<S>) -> BoxedExecutor {
        self._execute()
    }
}

impl Limit {
    pub(crate) fn _execute(self) -> BoxedExecutor {
        let Limit {
            offset,
            limit,
            input,
        } = self;

        if limit == Some(0) {
            return Box::new(iter::empty());
        }
        let mut skipped = 0;
        let offset = offset.unwrap_or(0);
        // errors are passed through and never counted as rows
        let rows = input.filter(move |tuple| {
            if tuple.is_err() || skipped >= offset {
                return true;
            }
            skipped += 1;
            false
        });

        match limit {
            Some(limit) => Box::new(rows.take(limit)),
            None => Box::new(rows),
        }
    }
}
