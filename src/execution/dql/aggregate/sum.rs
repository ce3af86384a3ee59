use crate::errors::DatabaseError;
use crate::execution::dql::aggregate::Accumulator;
use crate::expression::BinaryOperator;
use crate::types::value::{DataValue, ValueRef};
use crate::types::LogicalType;
use ahash::RandomState;
use std::collections::HashSet;
use std::sync::Arc;

pub struct SumAccumulator {
    /// `None` until the first non-null value
    result: Option<DataValue>,
    ty: LogicalType,
}

impl SumAccumulator {
    pub fn new(ty: &LogicalType) -> Result<Self, DatabaseError> {
        if !ty.is_numeric() {
            return Err(DatabaseError::InvalidType);
        }

        Ok(Self {
            result: None,
            ty: *ty,
        })
    }
}

impl Accumulator for SumAccumulator {
    fn update_value(&mut self, value: &ValueRef) -> Result<(), DatabaseError> {
        if value.is_null() {
            return Ok(());
        }
        let value = DataValue::clone(value).cast(&self.ty)?;

        self.result = Some(match self.result.take() {
            Some(result) => result.binary_op(&value, &BinaryOperator::Plus)?,
            None => value,
        });

        Ok(())
    }

    fn evaluate(&self) -> Result<ValueRef, DatabaseError> {
        Ok(Arc::new(
            self.result
                .clone()
                .unwrap_or_else(|| DataValue::none(&self.ty)),
        ))
    }
}

pub struct DistinctSumAccumulator {
    distinct_values: HashSet<ValueRef, RandomState>,
    inner: SumAccumulator,
}

impl DistinctSumAccumulator {
    pub fn new(ty: &LogicalType) -> Result<Self, DatabaseError> {
        Ok(Self {
            distinct_values: HashSet::default(),
            inner: SumAccumulator::new(ty)?,
        })
    }
}

impl Accumulator for DistinctSumAccumulator {
    fn update_value(&mut self, value: &ValueRef) -> Result<(), DatabaseError> {
        if !self.distinct_values.contains(value) {
            self.distinct_values.insert(value.clone());
            self.inner.update_value(value)?;
        }

        Ok(())
    }

    fn evaluate(&self) -> Result<ValueRef, DatabaseError> {
        self.inner.evaluate()
    }
}
