use crate::execution::{BoxedExecutor, QueryContext, ReadExecutor};
use crate::expression::ScalarExpression;
use crate::planner::operator::project::ProjectOperator;
use crate::storage::Storage;
use crate::types::tuple::{SchemaRef, Tuple};
use crate::types::value::ValueRef;

pub struct Projection {
    exprs: Vec<ScalarExpression>,
    schema: SchemaRef,
    input: BoxedExecutor,
}

impl From<(ProjectOperator, SchemaRef, BoxedExecutor)> for Projection {
    fn from(
        (ProjectOperator { exprs }, schema, input): (ProjectOperator, SchemaRef, BoxedExecutor),
    ) -> Self {
        Projection {
            exprs,
            schema,
            input,
        }
    }
}

impl<S: Storage> ReadExecutor<S> for Projection {
    fn execute(self, _ctx: &QueryContext<S>) -> BoxedExecutor {
        self._execute()
    }
}

impl Projection {
    pub(crate) fn _execute(self) -> BoxedExecutor {
        let Projection {
            exprs,
            schema,
            input,
        } = self;

        Box::new(input.map(move |tuple| {
            let tuple = tuple?;
            let values = exprs
                .iter()
                .map(|expr| expr.eval(&tuple, &schema))
                .collect::<Result<Vec<ValueRef>, _>>()?;

            Ok(Tuple::new(tuple.id, values))
        }))
    }
}

#[cfg(test)]
mod test {
    use crate::errors::DatabaseError;
    use crate::execution::dql::projection::Projection;
    use crate::execution::dql::test::{collect, executor, int_column, int_rows, ints};
    use crate::expression::{BinaryOperator, ScalarExpression};
    use crate::planner::operator::project::ProjectOperator;
    use crate::types::LogicalType;
    use std::sync::Arc;

    #[test]
    fn test_projection_reorders_and_computes() -> Result<(), DatabaseError> {
        let (a, b) = (int_column("a"), int_column("b"));
        let exprs = vec![
            ScalarExpression::ColumnRef(b.clone()),
            ScalarExpression::Binary {
                op: BinaryOperator::Plus,
                left_expr: Box::new(ScalarExpression::ColumnRef(a.clone())),
                right_expr: Box::new(ScalarExpression::ColumnRef(b.clone())),
                ty: LogicalType::Integer,
            },
        ];
        let projection = Projection::from((
            ProjectOperator { exprs },
            Arc::new(vec![a, b]),
            executor(int_rows(&[&[Some(1), Some(2)], &[Some(3), None]])),
        ));

        assert_eq!(
            ints(collect(projection._execute())?),
            vec![vec![Some(2), Some(3)], vec![None, None]]
        );

        Ok(())
    }
}
