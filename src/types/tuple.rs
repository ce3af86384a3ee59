use crate::catalog::ColumnRef;
use crate::errors::DatabaseError;
use crate::types::value::{DataValue, ValueRef};
use crate::types::LogicalType;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;
use std::mem;
use std::sync::Arc;

const BITS_MAX_INDEX: usize = 8;
const LEN_PREFIX: usize = 4;

/// The row key a tuple was read from.
pub type TupleId = Vec<u8>;
pub type Schema = Vec<ColumnRef>;
pub type SchemaRef = Arc<Schema>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    pub id: Option<TupleId>,
    pub values: Vec<ValueRef>,
}

impl Tuple {
    pub fn new(id: Option<TupleId>, values: Vec<ValueRef>) -> Self {
        Tuple { id, values }
    }

    pub fn estimated_size(&self) -> usize {
        mem::size_of::<Tuple>()
            + self.id.as_ref().map(Vec::len).unwrap_or(0)
            + self
                .values
                .iter()
                .map(|value| value.estimated_size())
                .sum::<usize>()
    }

    /// e.g.: bits(u8)..|len_0(u32)|value_0|len_1(u32)|value_1|
    /// Tips: null values only occupy their bit
    pub fn serialize_to(&self) -> Result<Vec<u8>, DatabaseError> {
        fn flip_bit(bits: u8, i: usize) -> u8 {
            bits | (1 << (7 - i))
        }

        let values_len = self.values.len();
        let bits_len = (values_len + BITS_MAX_INDEX) / BITS_MAX_INDEX;
        let mut bytes = vec![0_u8; bits_len];

        for (i, value) in self.values.iter().enumerate() {
            if value.is_null() {
                bytes[i / BITS_MAX_INDEX] = flip_bit(bytes[i / BITS_MAX_INDEX], i % BITS_MAX_INDEX);
            } else {
                let mut value_bytes = bincode::serialize(value.as_ref())?;

                bytes.extend_from_slice(&(value_bytes.len() as u32).to_le_bytes());
                bytes.append(&mut value_bytes);
            }
        }

        Ok(bytes)
    }

    pub fn deserialize_from(
        id: Option<TupleId>,
        types: &[LogicalType],
        bytes: &[u8],
    ) -> Result<Self, DatabaseError> {
        fn bit_index(bits: u8, i: usize) -> bool {
            bits & (1 << (7 - i)) > 0
        }
        fn truncated() -> DatabaseError {
            DatabaseError::InvalidValue("truncated tuple bytes".to_string())
        }

        let values_len = types.len();
        let bits_len = (values_len + BITS_MAX_INDEX) / BITS_MAX_INDEX;
        if bytes.len() < bits_len {
            return Err(truncated());
        }
        let mut values = Vec::with_capacity(values_len);
        let mut pos = bits_len;

        for (i, logic_type) in types.iter().enumerate() {
            if bit_index(bytes[i / BITS_MAX_INDEX], i % BITS_MAX_INDEX) {
                values.push(Arc::new(DataValue::none(logic_type)));
                continue;
            }
            let len_bytes: [u8; LEN_PREFIX] = bytes
                .get(pos..pos + LEN_PREFIX)
                .and_then(|slice| slice.try_into().ok())
                .ok_or_else(truncated)?;
            let len = u32::from_le_bytes(len_bytes) as usize;
            pos += LEN_PREFIX;

            let value_bytes = bytes.get(pos..pos + len).ok_or_else(truncated)?;
            values.push(Arc::new(bincode::deserialize::<DataValue>(value_bytes)?));
            pos += len;
        }

        Ok(Tuple { id, values })
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({})", self.values.iter().map(|value| value.to_string()).join(", "))
    }
}
