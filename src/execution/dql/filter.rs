use crate::execution::{BoxedExecutor, QueryContext, ReadExecutor};
use crate::expression::ScalarExpression;
use crate::planner::operator::filter::FilterOperator;
use crate::storage::Storage;
use crate::types::tuple::SchemaRef;

pub struct Filter {
    predicate: ScalarExpression,
    schema: SchemaRef,
    input: BoxedExecutor,
}

impl From<(FilterOperator, SchemaRef, BoxedExecutor)> for Filter {
    fn from(
        (FilterOperator { predicate }, schema, input): (FilterOperator, SchemaRef, BoxedExecutor),
    ) -> Self {
        Filter {
            predicate,
            schema,
            input,
        }
    }
}

impl<S: Storage> ReadExecutor<S> for Filter {
    fn execute(self, _ctx: &QueryContext<S>) -> BoxedExecutor {
        self._execute()
    }
}

impl Filter {
    pub(crate) fn _execute(self) -> BoxedExecutor {
        let Filter {
            predicate,
            schema,
            input,
        } = self;

        Box::new(input.filter_map(move |tuple| {
            let tuple = match tuple {
                Ok(tuple) => tuple,
                Err(err) => return Some(Err(err)),
            };
            // a null predicate drops the row
            match predicate
                .eval(&tuple, &schema)
                .and_then(|value| value.is_true())
            {
                Ok(true) => Some(Ok(tuple)),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            }
        }))
    }
}
