use crate::catalog::ColumnRef;
use crate::errors::DatabaseError;
use crate::planner::operator::sort::SortField;
use crate::types::tuple::Tuple;
use crate::types::value::{DataValue, ValueRef};
use std::cmp::Ordering;

/// Orders two values of one sort key.
///
/// Null placement is decided first and does not depend on the direction, so
/// all four combinations of ASC/DESC and NULLS FIRST/LAST are distinct.
pub fn compare_values(
    a: &DataValue,
    b: &DataValue,
    field: &SortField,
) -> Result<Ordering, DatabaseError> {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ok(Ordering::Equal),
        (true, false) if field.nulls_first => Ok(Ordering::Less),
        (true, false) => Ok(Ordering::Greater),
        (false, true) if field.nulls_first => Ok(Ordering::Greater),
        (false, true) => Ok(Ordering::Less),
        (false, false) => {
            let ordering = a.compare(b)?;

            Ok(if field.asc {
                ordering
            } else {
                ordering.reverse()
            })
        }
    }
}

/// First key that tells the rows apart wins.
pub fn try_compare_keys(
    a: &[ValueRef],
    b: &[ValueRef],
    fields: &[SortField],
) -> Result<Ordering, DatabaseError> {
    for ((a, b), field) in a.iter().zip(b.iter()).zip(fields.iter()) {
        let ordering = compare_values(a, b, field)?;

        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
    }
    Ok(Ordering::Equal)
}

/// Infallible form of [`try_compare_keys`] for keys already checked by a
/// [`KeyValidator`]; an incomparable pair counts as equal.
pub fn compare_keys(a: &[ValueRef], b: &[ValueRef], fields: &[SortField]) -> Ordering {
    try_compare_keys(a, b, fields).unwrap_or(Ordering::Equal)
}

pub fn compare_tuples(
    a: &Tuple,
    b: &Tuple,
    fields: &[SortField],
    schema: &[ColumnRef],
) -> Result<Ordering, DatabaseError> {
    try_compare_keys(
        &sort_keys(a, fields, schema)?,
        &sort_keys(b, fields, schema)?,
        fields,
    )
}

/// Values of every sort key of `tuple`, evaluated once per row.
pub fn sort_keys(
    tuple: &Tuple,
    fields: &[SortField],
    schema: &[ColumnRef],
) -> Result<Vec<ValueRef>, DatabaseError> {
    fields
        .iter()
        .map(|field| field.expr.eval(tuple, schema))
        .collect()
}

/// Rejects key rows whose values can not be ordered against the rows seen
/// before, so a sort can rely on [`compare_keys`] afterwards.
///
/// Keeps the first non-null value of each key as a sample; a scalar comparable
/// with the sample is comparable with every scalar the sample accepted. Tuple
/// keys are checked element by element, since their comparison stops at the
/// first unequal element.
#[derive(Debug, Default)]
pub struct KeyValidator {
    samples: Vec<KeySample>,
}

#[derive(Debug, Default)]
enum KeySample {
    #[default]
    Empty,
    Scalar(ValueRef),
    Tuple(ValueRef, KeyValidator),
}

impl KeySample {
    fn new(key: &ValueRef) -> Result<Self, DatabaseError> {
        Ok(match key.as_ref() {
            DataValue::Tuple(Some(values)) => {
                let mut elements = KeyValidator::default();
                elements.validate(values)?;
                KeySample::Tuple(key.clone(), elements)
            }
            _ => KeySample::Scalar(key.clone()),
        })
    }
}

impl KeyValidator {
    pub fn validate(&mut self, keys: &[ValueRef]) -> Result<(), DatabaseError> {
        if self.samples.len() < keys.len() {
            self.samples.resize_with(keys.len(), KeySample::default);
        }
        for (sample, key) in self.samples.iter_mut().zip(keys.iter()) {
            if key.is_null() {
                continue;
            }
            match sample {
                KeySample::Empty => *sample = KeySample::new(key)?,
                KeySample::Tuple(value, elements) => match key.as_ref() {
                    DataValue::Tuple(Some(values)) => elements.validate(values)?,
                    _ => {
                        value.compare(key)?;
                    }
                },
                KeySample::Scalar(value) => {
                    value.compare(key)?;
                }
            }
        }

        Ok(())
    }
}
