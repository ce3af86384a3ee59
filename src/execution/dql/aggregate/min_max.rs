use crate::errors::DatabaseError;
use crate::execution::dql::aggregate::Accumulator;
use crate::types::value::{DataValue, ValueRef};
use crate::types::LogicalType;
use std::cmp::Ordering;
use std::sync::Arc;

pub struct MinMaxAccumulator {
    inner: Option<ValueRef>,
    /// Ordering of a new value against the current one that replaces it
    replace_on: Ordering,
    ty: LogicalType,
}

impl MinMaxAccumulator {
    pub fn new(ty: &LogicalType, is_max: bool) -> Self {
        let replace_on = if is_max {
            Ordering::Greater
        } else {
            Ordering::Less
        };

        Self {
            inner: None,
            replace_on,
            ty: *ty,
        }
    }
}

impl Accumulator for MinMaxAccumulator {
    fn update_value(&mut self, value: &ValueRef) -> Result<(), DatabaseError> {
        if value.is_null() {
            return Ok(());
        }
        let replace = match &self.inner {
            Some(inner_value) => value.compare(inner_value)? == self.replace_on,
            None => true,
        };
        if replace {
            self.inner = Some(value.clone());
        }

        Ok(())
    }

    fn evaluate(&self) -> Result<ValueRef, DatabaseError> {
        Ok(self
            .inner
            .clone()
            .unwrap_or_else(|| Arc::new(DataValue::none(&self.ty))))
    }
}

#[cfg(test)]
mod test {
    use crate::errors::DatabaseError;
    use crate::execution::dql::aggregate::min_max::MinMaxAccumulator;
    use crate::execution::dql::aggregate::Accumulator;
    use crate::types::value::DataValue;
    use crate::types::LogicalType;
    use std::sync::Arc;

    #[test]
    fn test_min_max() -> Result<(), DatabaseError> {
        let mut min = MinMaxAccumulator::new(&LogicalType::Varchar(None), false);
        let mut max = MinMaxAccumulator::new(&LogicalType::Varchar(None), true);
        assert!(max.evaluate()?.is_null());

        for value in [Some("b"), None, Some("c"), Some("a")] {
            let value = Arc::new(DataValue::Utf8(value.map(String::from)));
            min.update_value(&value)?;
            max.update_value(&value)?;
        }
        assert_eq!(*min.evaluate()?, DataValue::from("a"));
        assert_eq!(*max.evaluate()?, DataValue::from("c"));

        Ok(())
    }
}
