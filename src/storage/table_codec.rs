use crate::catalog::TableCatalog;
use crate::errors::DatabaseError;
use crate::storage::KeyRange;
use crate::types::tuple::Tuple;
use crate::types::value::DataValue;
use crate::types::LogicalType;

const NOT_NULL_FLAG: u8 = 0x00;
const NULL_FLAG: u8 = 0x01;

/// Row layout of a table inside its regions.
///
/// Key: [salt byte] | per primary key column: flag(u8) | memcomparable value
/// Value: Tuple
///
/// A null sorts after every value of its column. Descending columns have all
/// their bytes inverted, so a scan yields ascending columns nulls last and
/// descending columns nulls first.
#[derive(Clone)]
pub struct TableCodec<'a> {
    pub table: &'a TableCatalog,
}

impl<'a> TableCodec<'a> {
    pub fn new(table: &'a TableCatalog) -> Self {
        TableCodec { table }
    }

    fn encode_key_value(
        value: &DataValue,
        descending: bool,
        bytes: &mut Vec<u8>,
    ) -> Result<(), DatabaseError> {
        let start = bytes.len();

        if value.is_null() {
            bytes.push(NULL_FLAG);
        } else {
            bytes.push(NOT_NULL_FLAG);
            value.memcomparable_encode(bytes)?;
        }
        if descending {
            for byte in bytes[start..].iter_mut() {
                *byte = !*byte;
            }
        }
        Ok(())
    }

    fn encode_primary_key(&self, values: &[DataValue]) -> Result<Vec<u8>, DatabaseError> {
        let mut bytes = Vec::new();

        for (value, column) in values.iter().zip(self.table.primary_keys()) {
            Self::encode_key_value(value, column.desc.is_descending(), &mut bytes)?;
        }
        Ok(bytes)
    }

    /// Same bucket assignment for the same primary key bytes across runs.
    pub fn salt_byte(primary_key: &[u8], buckets: u8) -> u8 {
        let hash = primary_key
            .iter()
            .fold(0_i32, |hash, byte| hash.wrapping_mul(31).wrapping_add(*byte as i32));

        (hash.unsigned_abs() % buckets as u32) as u8
    }

    pub fn encode_tuple_key(&self, tuple: &Tuple) -> Result<Vec<u8>, DatabaseError> {
        let primary_values = self
            .table
            .primary_keys_indices()
            .iter()
            .map(|i| {
                tuple
                    .values
                    .get(*i)
                    .map(|value| DataValue::clone(value))
                    .ok_or(DatabaseError::MisMatch(self.table.columns_len(), tuple.values.len()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let primary_key = self.encode_primary_key(&primary_values)?;

        Ok(match self.table.salt_buckets() {
            Some(buckets) => {
                let mut key = Vec::with_capacity(primary_key.len() + 1);
                key.push(Self::salt_byte(&primary_key, buckets));
                key.extend(primary_key);
                key
            }
            None => primary_key,
        })
    }

    pub fn encode_tuple(&self, tuple: &Tuple) -> Result<(Vec<u8>, Vec<u8>), DatabaseError> {
        let key = self.encode_tuple_key(tuple)?;

        Ok((key, tuple.serialize_to()?))
    }

    pub fn decode_tuple(
        types: &[LogicalType],
        key: Vec<u8>,
        bytes: &[u8],
    ) -> Result<Tuple, DatabaseError> {
        Tuple::deserialize_from(Some(key), types, bytes)
    }

    /// Key ranges of the regions a new table starts with, in key order.
    pub fn region_ranges(&self) -> Result<Vec<KeyRange>, DatabaseError> {
        if let Some(buckets) = self.table.salt_buckets() {
            return Ok((0..buckets)
                .map(|bucket| {
                    let end = bucket.checked_add(1).filter(|next| *next < buckets);
                    KeyRange::new(
                        (bucket > 0).then(|| vec![bucket]),
                        end.map(|next| vec![next]),
                    )
                })
                .collect());
        }
        let mut split_keys = self
            .table
            .split_points()
            .iter()
            .map(|point| self.encode_primary_key(point))
            .collect::<Result<Vec<_>, _>>()?;
        split_keys.sort();
        split_keys.dedup();

        Ok(KeyRange::full().split_at(&split_keys))
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{ColumnCatalog, ColumnDesc, TableCatalog};
    use crate::errors::DatabaseError;
    use crate::storage::table_codec::TableCodec;
    use crate::types::tuple::Tuple;
    use crate::types::value::DataValue;
    use crate::types::LogicalType;
    use itertools::Itertools;
    use std::sync::Arc;

    fn build_table() -> Result<TableCatalog, DatabaseError> {
        TableCatalog::new(
            Arc::new("t1".to_string()),
            vec![
                ColumnCatalog::new(
                    "organization_id".to_string(),
                    true,
                    ColumnDesc::new(LogicalType::Varchar(None), Some(0), true),
                ),
                ColumnCatalog::new(
                    "entity_id".to_string(),
                    false,
                    ColumnDesc::new(LogicalType::Integer, Some(1), false),
                ),
                ColumnCatalog::new(
                    "v".to_string(),
                    true,
                    ColumnDesc::new(LogicalType::Varchar(None), None, false),
                ),
            ],
        )
    }

    fn tuple(organization_id: Option<&str>, entity_id: i32) -> Tuple {
        Tuple::new(
            None,
            vec![
                Arc::new(DataValue::Utf8(organization_id.map(String::from))),
                Arc::new(DataValue::Int32(Some(entity_id))),
                Arc::new(DataValue::Utf8(None)),
            ],
        )
    }

    #[test]
    fn test_key_order_follows_direction_and_nulls() -> Result<(), DatabaseError> {
        let table = build_table()?;
        let codec = TableCodec::new(&table);

        let rows = vec![
            tuple(Some("a"), 2),
            tuple(None, 7),
            tuple(Some("c"), 1),
            tuple(Some("a"), -1),
            tuple(Some("ab"), 0),
        ];
        let mut keyed = rows
            .iter()
            .map(|row| Ok((codec.encode_tuple_key(row)?, row.clone())))
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));

        // organization_id DESC (nulls first), entity_id ASC
        let order = keyed
            .into_iter()
            .map(|(_, row)| (row.values[0].to_string(), row.values[1].to_string()))
            .collect_vec();
        assert_eq!(
            order,
            vec![
                ("null".to_string(), "7".to_string()),
                ("c".to_string(), "1".to_string()),
                ("ab".to_string(), "0".to_string()),
                ("a".to_string(), "-1".to_string()),
                ("a".to_string(), "2".to_string()),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_region_ranges() -> Result<(), DatabaseError> {
        let salted = build_table()?.with_salt_buckets(3)?;
        let codec = TableCodec::new(&salted);
        let ranges = codec.region_ranges()?;

        assert_eq!(ranges.len(), 3);
        for row in [tuple(Some("a"), 1), tuple(None, 2), tuple(Some("zz"), 3)] {
            let key = codec.encode_tuple_key(&row)?;
            assert_eq!(ranges.iter().filter(|range| range.contains(&key)).count(), 1);
            assert!(ranges[key[0] as usize].contains(&key));
        }

        let split = build_table()?.with_split_points(vec![
            vec![DataValue::from("m")],
            vec![DataValue::from("b")],
        ])?;
        let codec = TableCodec::new(&split);
        let ranges = codec.region_ranges()?;
        assert_eq!(ranges.len(), 3);

        // descending leading key: "m" sorts before "b"
        let key_z = codec.encode_tuple_key(&tuple(Some("z"), 1))?;
        let key_a = codec.encode_tuple_key(&tuple(Some("a"), 1))?;
        assert!(ranges[0].contains(&key_z));
        assert!(ranges[2].contains(&key_a));

        Ok(())
    }
}
