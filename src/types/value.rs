use crate::errors::DatabaseError;
use crate::types::LogicalType;
use chrono::format::{DelayedFormat, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use ordered_float::OrderedFloat;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Formatter;
use std::hash::{Hash, Hasher};
use std::mem;
use std::str::FromStr;
use std::sync::Arc;

lazy_static! {
    pub static ref NULL_VALUE: ValueRef = Arc::new(DataValue::Null);
    static ref UNIX_EPOCH_DATE: NaiveDate = NaiveDate::default();
}

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const DATE_TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const MILLIS_PER_DAY: i64 = 86_400_000;
const ENCODE_GROUP_SIZE: usize = 8;
const ENCODE_MARKER: u8 = 0xFF;

pub type ValueRef = Arc<DataValue>;

#[derive(Clone, Serialize, Deserialize)]
pub enum DataValue {
    Null,
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Utf8(Option<String>),
    /// Date stored as a signed 32bit int days since UNIX epoch 1970-01-01
    Date32(Option<i32>),
    /// Date stored as a signed 64bit int milliseconds since UNIX epoch 1970-01-01
    Date64(Option<i64>),
    Tuple(Option<Vec<ValueRef>>),
}

/// Numeric view of a value, compared by magnitude whatever the storage type.
#[derive(Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
}

impl Numeric {
    fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(v) => v as f64,
            Numeric::Float(v) => v,
            Numeric::Decimal(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    fn cmp(self, other: Numeric) -> Ordering {
        match (self, other) {
            (Numeric::Int(v1), Numeric::Int(v2)) => v1.cmp(&v2),
            (Numeric::Int(v1), Numeric::Decimal(v2)) => Decimal::from(v1).cmp(&v2),
            (Numeric::Decimal(v1), Numeric::Int(v2)) => v1.cmp(&Decimal::from(v2)),
            (Numeric::Decimal(v1), Numeric::Decimal(v2)) => v1.cmp(&v2),
            (Numeric::Float(v1), Numeric::Float(v2)) => OrderedFloat(v1).cmp(&OrderedFloat(v2)),
            (Numeric::Float(v1), Numeric::Int(v2)) => cmp_float_scaled(v1, v2 as i128, 0),
            (Numeric::Float(v1), Numeric::Decimal(v2)) => {
                cmp_float_scaled(v1, v2.mantissa(), v2.scale())
            }
            (v1, v2 @ Numeric::Float(_)) => v2.cmp(v1).reverse(),
        }
    }
}

/// Exact comparison of `float` with `mantissa / 10^scale`, NaN being the
/// greatest value as with `OrderedFloat`.
fn cmp_float_scaled(float: f64, mantissa: i128, scale: u32) -> Ordering {
    if float.is_nan() {
        return Ordering::Greater;
    }
    if float == 0.0 || mantissa == 0 || (float < 0.0) != (mantissa < 0) {
        let sign = if float > 0.0 {
            1
        } else if float < 0.0 {
            -1
        } else {
            0
        };
        return sign.cmp(&mantissa.signum());
    }
    let ordering = cmp_abs_float_scaled(float.abs(), mantissa.unsigned_abs(), scale);

    if float < 0.0 {
        ordering.reverse()
    } else {
        ordering
    }
}

/// `float` is positive, `mantissa` below 2^96 and `scale` at most 28.
fn cmp_abs_float_scaled(float: f64, mantissa: u128, scale: u32) -> Ordering {
    if float.is_infinite() {
        return Ordering::Greater;
    }
    let bits = float.to_bits();
    let biased_exp = ((bits >> 52) & 0x7ff) as i32;
    let fraction = (bits & 0x000f_ffff_ffff_ffff) as u128;
    let (float_mantissa, exp) = if biased_exp == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased_exp - 1075)
    };
    // float * 10^scale = float_mantissa * 5^scale * 2^(exp + scale)
    let scaled = float_mantissa * 5_u128.pow(scale);
    let shift = exp + scale as i32;

    if shift >= 0 {
        if shift as u32 >= scaled.leading_zeros() {
            return Ordering::Greater;
        }
        (scaled << shift).cmp(&mantissa)
    } else {
        let shift = shift.unsigned_abs();
        let (whole, rest) = if shift >= 128 {
            (0, scaled)
        } else {
            (scaled >> shift, scaled & ((1 << shift) - 1))
        };

        whole
            .cmp(&mantissa)
            .then(if rest > 0 { Ordering::Greater } else { Ordering::Equal })
    }
}

macro_rules! encode_u {
    ($b:ident, $u:expr) => {
        $b.extend_from_slice(&$u.to_be_bytes())
    };
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        use DataValue::*;

        if self.is_null() && other.is_null() {
            return true;
        }

        match (self, other) {
            (Boolean(v1), Boolean(v2)) => v1.eq(v2),
            (Int32(v1), Int32(v2)) => v1.eq(v2),
            (Int64(v1), Int64(v2)) => v1.eq(v2),
            (Float64(v1), Float64(v2)) => v1.map(OrderedFloat).eq(&v2.map(OrderedFloat)),
            (Decimal(v1), Decimal(v2)) => v1.eq(v2),
            (Utf8(v1), Utf8(v2)) => v1.eq(v2),
            (Date32(v1), Date32(v2)) => v1.eq(v2),
            (Date64(v1), Date64(v2)) => v1.eq(v2),
            (Tuple(v1), Tuple(v2)) => v1.eq(v2),
            _ => false,
        }
    }
}

impl Eq for DataValue {}

impl Hash for DataValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use DataValue::*;

        // every null is equal to every other null
        if self.is_null() {
            return 0_u8.hash(state);
        }
        mem::discriminant(self).hash(state);

        match self {
            Boolean(v) => v.hash(state),
            Int32(v) => v.hash(state),
            Int64(v) => v.hash(state),
            Float64(v) => v.map(OrderedFloat).hash(state),
            Decimal(v) => v.hash(state),
            Utf8(v) => v.hash(state),
            Date32(v) => v.hash(state),
            Date64(v) => v.hash(state),
            Tuple(v) => v.hash(state),
            Null => (),
        }
    }
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        match self {
            DataValue::Null => true,
            DataValue::Boolean(value) => value.is_none(),
            DataValue::Int32(value) => value.is_none(),
            DataValue::Int64(value) => value.is_none(),
            DataValue::Float64(value) => value.is_none(),
            DataValue::Decimal(value) => value.is_none(),
            DataValue::Utf8(value) => value.is_none(),
            DataValue::Date32(value) => value.is_none(),
            DataValue::Date64(value) => value.is_none(),
            DataValue::Tuple(value) => value.is_none(),
        }
    }

    pub fn none(logic_type: &LogicalType) -> DataValue {
        match logic_type {
            LogicalType::SqlNull => DataValue::Null,
            LogicalType::Boolean => DataValue::Boolean(None),
            LogicalType::Integer => DataValue::Int32(None),
            LogicalType::Bigint => DataValue::Int64(None),
            LogicalType::Double => DataValue::Float64(None),
            LogicalType::Decimal(_, _) => DataValue::Decimal(None),
            LogicalType::Varchar(_) => DataValue::Utf8(None),
            LogicalType::Date => DataValue::Date32(None),
            LogicalType::DateTime => DataValue::Date64(None),
            LogicalType::Tuple => DataValue::Tuple(None),
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            DataValue::Null => LogicalType::SqlNull,
            DataValue::Boolean(_) => LogicalType::Boolean,
            DataValue::Int32(_) => LogicalType::Integer,
            DataValue::Int64(_) => LogicalType::Bigint,
            DataValue::Float64(_) => LogicalType::Double,
            DataValue::Decimal(_) => LogicalType::Decimal(None, None),
            DataValue::Utf8(_) => LogicalType::Varchar(None),
            DataValue::Date32(_) => LogicalType::Date,
            DataValue::Date64(_) => LogicalType::DateTime,
            DataValue::Tuple(_) => LogicalType::Tuple,
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            DataValue::Int32(Some(v)) => Some(Numeric::Int(*v as i64)),
            DataValue::Int64(Some(v)) => Some(Numeric::Int(*v)),
            DataValue::Float64(Some(v)) => Some(Numeric::Float(*v)),
            DataValue::Decimal(Some(v)) => Some(Numeric::Decimal(*v)),
            _ => None,
        }
    }

    fn millis(&self) -> Option<i64> {
        match self {
            DataValue::Date32(Some(days)) => Some(*days as i64 * MILLIS_PER_DAY),
            DataValue::Date64(Some(millis)) => Some(*millis),
            _ => None,
        }
    }

    /// Natural order of two values.
    ///
    /// Numbers compare by magnitude across `Int32`/`Int64`/`Float64`/`Decimal`,
    /// text compares byte-wise, dates compare chronologically and tuples
    /// lexicographically. A null is lower than any value here; placement of
    /// nulls inside an ORDER BY is decided by the sort field, not by this method.
    pub fn compare(&self, other: &DataValue) -> Result<Ordering, DatabaseError> {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) => return Ok(Ordering::Less),
            (false, true) => return Ok(Ordering::Greater),
            (false, false) => (),
        }
        if let (Some(v1), Some(v2)) = (self.numeric(), other.numeric()) {
            return Ok(v1.cmp(v2));
        }
        if let (Some(v1), Some(v2)) = (self.millis(), other.millis()) {
            return Ok(v1.cmp(&v2));
        }

        match (self, other) {
            (DataValue::Boolean(Some(v1)), DataValue::Boolean(Some(v2))) => Ok(v1.cmp(v2)),
            (DataValue::Utf8(Some(v1)), DataValue::Utf8(Some(v2))) => {
                Ok(v1.as_bytes().cmp(v2.as_bytes()))
            }
            (DataValue::Tuple(Some(values_1)), DataValue::Tuple(Some(values_2))) => {
                for (v1, v2) in values_1.iter().zip(values_2.iter()) {
                    let ordering = v1.compare(v2)?;

                    if ordering != Ordering::Equal {
                        return Ok(ordering);
                    }
                }
                Ok(values_1.len().cmp(&values_2.len()))
            }
            _ => Err(DatabaseError::ComparisonTypeError(
                self.logical_type(),
                other.logical_type(),
            )),
        }
    }

    pub fn is_true(&self) -> Result<bool, DatabaseError> {
        if self.is_null() {
            return Ok(false);
        }
        if let DataValue::Boolean(option) = self {
            Ok(matches!(option, Some(true)))
        } else {
            Err(DatabaseError::InvalidType)
        }
    }

    /// Approximate heap footprint, used to account buffered rows against a memory budget.
    pub fn estimated_size(&self) -> usize {
        let inner = match self {
            DataValue::Utf8(Some(value)) => value.len(),
            DataValue::Tuple(Some(values)) => values.iter().map(|v| v.estimated_size()).sum(),
            _ => 0,
        };
        mem::size_of::<DataValue>() + inner
    }

    // Refer: https://github.com/facebook/mysql-5.6/wiki/MyRocks-record-format#memcomparable-format
    fn encode_bytes(b: &mut Vec<u8>, data: &[u8]) {
        let d_len = data.len();
        b.reserve((d_len / ENCODE_GROUP_SIZE + 1) * (ENCODE_GROUP_SIZE + 1));

        let mut idx = 0;
        while idx <= d_len {
            let remain = d_len - idx;
            let pad_count: usize;

            if remain >= ENCODE_GROUP_SIZE {
                b.extend_from_slice(&data[idx..idx + ENCODE_GROUP_SIZE]);
                pad_count = 0;
            } else {
                pad_count = ENCODE_GROUP_SIZE - remain;
                b.extend_from_slice(&data[idx..]);
                b.extend_from_slice(&vec![0; pad_count]);
            }

            b.push(ENCODE_MARKER - pad_count as u8);
            idx += ENCODE_GROUP_SIZE;
        }
    }

    /// Order preserving byte encoding of a non-null value.
    pub fn memcomparable_encode(&self, b: &mut Vec<u8>) -> Result<(), DatabaseError> {
        match self {
            DataValue::Int32(Some(v)) | DataValue::Date32(Some(v)) => {
                encode_u!(b, *v as u32 ^ 0x80000000_u32)
            }
            DataValue::Int64(Some(v)) | DataValue::Date64(Some(v)) => {
                encode_u!(b, *v as u64 ^ 0x8000000000000000_u64)
            }
            DataValue::Utf8(Some(v)) => Self::encode_bytes(b, v.as_bytes()),
            DataValue::Boolean(Some(v)) => b.push(if *v { b'1' } else { b'0' }),
            DataValue::Float64(Some(f)) => {
                let mut u = f.to_bits();

                if *f >= 0_f64 {
                    u |= 0x8000000000000000_u64;
                } else {
                    u = !u;
                }

                encode_u!(b, u);
            }
            DataValue::Tuple(Some(values)) => {
                for v in values.iter() {
                    v.memcomparable_encode(b)?;
                    b.push(0u8);
                }
            }
            value => {
                if !value.is_null() {
                    return Err(DatabaseError::InvalidType);
                }
            }
        }

        Ok(())
    }

    pub fn cast(self, to: &LogicalType) -> Result<DataValue, DatabaseError> {
        if self.is_null() {
            return Ok(DataValue::none(to));
        }
        if let Some(numeric) = self.numeric() {
            let value = match (to, numeric) {
                (LogicalType::Integer, Numeric::Int(v)) => {
                    DataValue::Int32(Some(i32::try_from(v).map_err(|_| Self::cast_fail(v, to))?))
                }
                (LogicalType::Integer, v) => DataValue::Int32(v.to_f64().to_i32()),
                (LogicalType::Bigint, Numeric::Int(v)) => DataValue::Int64(Some(v)),
                (LogicalType::Bigint, v) => DataValue::Int64(v.to_f64().to_i64()),
                (LogicalType::Double, v) => DataValue::Float64(Some(v.to_f64())),
                (LogicalType::Decimal(_, scale), v) => {
                    let mut decimal = match v {
                        Numeric::Int(v) => Decimal::from(v),
                        Numeric::Decimal(v) => v,
                        Numeric::Float(v) => {
                            Decimal::from_f64(v).ok_or_else(|| Self::cast_fail(v, to))?
                        }
                    };
                    if let Some(scale) = scale {
                        decimal = decimal.round_dp(*scale as u32);
                    }
                    DataValue::Decimal(Some(decimal))
                }
                (LogicalType::Varchar(_), _) => DataValue::Utf8(Some(self.to_string())),
                _ => return Err(DatabaseError::InvalidType),
            };
            return if value.is_null() {
                Err(Self::cast_fail(self, to))
            } else {
                Ok(value)
            };
        }

        match (self, to) {
            (DataValue::Boolean(v), LogicalType::Boolean) => Ok(DataValue::Boolean(v)),
            (DataValue::Utf8(v), LogicalType::Varchar(_)) => Ok(DataValue::Utf8(v)),
            (DataValue::Utf8(Some(v)), LogicalType::Date) => {
                let date = NaiveDate::parse_from_str(&v, DATE_FMT)
                    .map_err(|_| Self::cast_fail(&v, to))?;
                let days = date.signed_duration_since(*UNIX_EPOCH_DATE).num_days();

                Ok(DataValue::Date32(Some(days as i32)))
            }
            (DataValue::Utf8(Some(v)), LogicalType::DateTime) => {
                let date_time = NaiveDateTime::parse_from_str(&v, DATE_TIME_FMT)
                    .map_err(|_| Self::cast_fail(&v, to))?;

                Ok(DataValue::Date64(Some(date_time.and_utc().timestamp_millis())))
            }
            (DataValue::Date32(v), LogicalType::Date) => Ok(DataValue::Date32(v)),
            (DataValue::Date32(v), LogicalType::DateTime) => {
                Ok(DataValue::Date64(v.map(|days| days as i64 * MILLIS_PER_DAY)))
            }
            (DataValue::Date64(v), LogicalType::DateTime) => Ok(DataValue::Date64(v)),
            (DataValue::Tuple(v), LogicalType::Tuple) => Ok(DataValue::Tuple(v)),
            (value, LogicalType::Varchar(_)) => Ok(DataValue::Utf8(Some(value.to_string()))),
            _ => Err(DatabaseError::InvalidType),
        }
    }

    fn cast_fail(value: impl fmt::Display, to: &LogicalType) -> DatabaseError {
        DatabaseError::InvalidValue(format!("{} can not cast to {}", value, to))
    }

    fn date_format<'a>(v: i32) -> Option<DelayedFormat<StrftimeItems<'a>>> {
        DateTime::from_timestamp(v as i64 * 86_400, 0).map(|date| date.format(DATE_FMT))
    }

    fn date_time_format<'a>(v: i64) -> Option<DelayedFormat<StrftimeItems<'a>>> {
        DateTime::from_timestamp_millis(v).map(|date_time| date_time.format(DATE_TIME_FMT))
    }
}

macro_rules! impl_scalar {
    ($ty:ty, $scalar:tt) => {
        impl From<$ty> for DataValue {
            fn from(value: $ty) -> Self {
                DataValue::$scalar(Some(value))
            }
        }

        impl From<Option<$ty>> for DataValue {
            fn from(value: Option<$ty>) -> Self {
                DataValue::$scalar(value)
            }
        }
    };
}

impl_scalar!(bool, Boolean);
impl_scalar!(i32, Int32);
impl_scalar!(i64, Int64);
impl_scalar!(f64, Float64);
impl_scalar!(Decimal, Decimal);
impl_scalar!(String, Utf8);

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Utf8(Some(value.to_string()))
    }
}

impl TryFrom<&sqlparser::ast::Value> for DataValue {
    type Error = DatabaseError;

    fn try_from(value: &sqlparser::ast::Value) -> Result<Self, Self::Error> {
        use sqlparser::ast::Value;

        Ok(match value {
            Value::Number(n, _) => {
                if let Ok(v) = n.parse::<i32>() {
                    DataValue::Int32(Some(v))
                } else if let Ok(v) = n.parse::<i64>() {
                    DataValue::Int64(Some(v))
                } else if let Ok(v) = Decimal::from_str(n) {
                    DataValue::Decimal(Some(v))
                } else {
                    DataValue::Float64(Some(
                        n.parse::<f64>()
                            .map_err(|_| DatabaseError::InvalidValue(n.clone()))?,
                    ))
                }
            }
            Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => {
                DataValue::Utf8(Some(s.clone()))
            }
            Value::Boolean(b) => DataValue::Boolean(Some(*b)),
            Value::Null => DataValue::Null,
            v => return Err(DatabaseError::InvalidValue(v.to_string())),
        })
    }
}

macro_rules! format_option {
    ($F:expr, $EXPR:expr) => {
        match $EXPR {
            Some(e) => write!($F, "{}", e),
            None => write!($F, "null"),
        }
    };
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DataValue::Boolean(e) => format_option!(f, e)?,
            DataValue::Int32(e) => format_option!(f, e)?,
            DataValue::Int64(e) => format_option!(f, e)?,
            DataValue::Float64(e) => format_option!(f, e)?,
            DataValue::Decimal(e) => format_option!(f, e)?,
            DataValue::Utf8(e) => format_option!(f, e)?,
            DataValue::Null => write!(f, "null")?,
            DataValue::Date32(e) => format_option!(f, e.and_then(DataValue::date_format))?,
            DataValue::Date64(e) => format_option!(f, e.and_then(DataValue::date_time_format))?,
            DataValue::Tuple(e) => {
                write!(f, "(")?;
                if let Some(values) = e {
                    let len = values.len();

                    for (i, value) in values.iter().enumerate() {
                        value.fmt(f)?;
                        if len != i + 1 {
                            write!(f, ", ")?;
                        }
                    }
                }
                write!(f, ")")?;
            }
        };
        Ok(())
    }
}

impl fmt::Debug for DataValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DataValue::Boolean(_) => write!(f, "Boolean({})", self),
            DataValue::Int32(_) => write!(f, "Int32({})", self),
            DataValue::Int64(_) => write!(f, "Int64({})", self),
            DataValue::Float64(_) => write!(f, "Float64({})", self),
            DataValue::Decimal(_) => write!(f, "Decimal({})", self),
            DataValue::Utf8(None) => write!(f, "Utf8({})", self),
            DataValue::Utf8(Some(_)) => write!(f, "Utf8(\"{}\")", self),
            DataValue::Null => write!(f, "null"),
            DataValue::Date32(_) => write!(f, "Date32({})", self),
            DataValue::Date64(_) => write!(f, "Date64({})", self),
            DataValue::Tuple(_) => write!(f, "Tuple({})", self),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::errors::DatabaseError;
    use crate::types::value::DataValue;
    use crate::types::LogicalType;
    use rust_decimal::Decimal;
    use std::cmp::Ordering;
    use std::str::FromStr;
    use std::sync::Arc;

    #[test]
    fn test_mem_comparable_int() -> Result<(), DatabaseError> {
        let mut key_i32_1 = Vec::new();
        let mut key_i32_2 = Vec::new();
        let mut key_i32_3 = Vec::new();

        DataValue::Int32(Some(i32::MIN)).memcomparable_encode(&mut key_i32_1)?;
        DataValue::Int32(Some(-1_i32)).memcomparable_encode(&mut key_i32_2)?;
        DataValue::Int32(Some(i32::MAX)).memcomparable_encode(&mut key_i32_3)?;

        assert!(key_i32_1 < key_i32_2);
        assert!(key_i32_2 < key_i32_3);

        let mut key_i64_1 = Vec::new();
        let mut key_i64_2 = Vec::new();

        DataValue::Int64(Some(-10_i64)).memcomparable_encode(&mut key_i64_1)?;
        DataValue::Int64(Some(3_i64)).memcomparable_encode(&mut key_i64_2)?;

        assert!(key_i64_1 < key_i64_2);

        Ok(())
    }

    #[test]
    fn test_mem_comparable_float_and_utf8() -> Result<(), DatabaseError> {
        let mut key_f64_1 = Vec::new();
        let mut key_f64_2 = Vec::new();
        let mut key_f64_3 = Vec::new();

        DataValue::Float64(Some(f64::MIN)).memcomparable_encode(&mut key_f64_1)?;
        DataValue::Float64(Some(-1_f64)).memcomparable_encode(&mut key_f64_2)?;
        DataValue::Float64(Some(f64::MAX)).memcomparable_encode(&mut key_f64_3)?;

        assert!(key_f64_1 < key_f64_2);
        assert!(key_f64_2 < key_f64_3);

        let mut key_abc = Vec::new();
        let mut key_abcd = Vec::new();
        let mut key_abz = Vec::new();

        DataValue::from("abc").memcomparable_encode(&mut key_abc)?;
        DataValue::from("abcd").memcomparable_encode(&mut key_abcd)?;
        DataValue::from("abz").memcomparable_encode(&mut key_abz)?;

        assert!(key_abc < key_abcd);
        assert!(key_abcd < key_abz);

        Ok(())
    }

    #[test]
    fn test_compare_numeric_across_types() -> Result<(), DatabaseError> {
        let int = DataValue::Int32(Some(1));
        let bigint = DataValue::Int64(Some(2));
        let double = DataValue::Float64(Some(1.5));
        let decimal = DataValue::Decimal(Some(Decimal::from_str("1.25").unwrap()));

        assert_eq!(int.compare(&bigint)?, Ordering::Less);
        assert_eq!(double.compare(&int)?, Ordering::Greater);
        assert_eq!(decimal.compare(&double)?, Ordering::Less);
        assert_eq!(decimal.compare(&int)?, Ordering::Greater);
        assert_eq!(
            DataValue::Int64(Some(1)).compare(&DataValue::Decimal(Some(Decimal::ONE)))?,
            Ordering::Equal
        );

        Ok(())
    }

    #[test]
    fn test_compare_float_exactly() -> Result<(), DatabaseError> {
        let two_pow_53 = 1_i64 << 53;
        let float = DataValue::Float64(Some(two_pow_53 as f64));

        assert_eq!(
            DataValue::Int64(Some(two_pow_53 + 1)).compare(&float)?,
            Ordering::Greater
        );
        assert_eq!(DataValue::Int64(Some(two_pow_53)).compare(&float)?, Ordering::Equal);
        assert_eq!(
            float.compare(&DataValue::Int64(Some(two_pow_53 - 1)))?,
            Ordering::Greater
        );
        assert_eq!(
            DataValue::Float64(Some(-0.5)).compare(&DataValue::Int32(Some(0)))?,
            Ordering::Less
        );
        assert_eq!(
            DataValue::Float64(Some(-0.0)).compare(&DataValue::Int32(Some(0)))?,
            Ordering::Equal
        );
        assert_eq!(
            DataValue::Float64(Some(f64::NEG_INFINITY)).compare(&DataValue::Int64(Some(i64::MIN)))?,
            Ordering::Less
        );
        assert_eq!(
            DataValue::Float64(Some(f64::NAN)).compare(&DataValue::Int64(Some(i64::MAX)))?,
            Ordering::Greater
        );

        // 0.1 is stored slightly above one tenth
        let tenth = DataValue::Decimal(Some(Decimal::from_str("0.1").unwrap()));
        assert_eq!(DataValue::Float64(Some(0.1)).compare(&tenth)?, Ordering::Greater);
        assert_eq!(tenth.compare(&DataValue::Float64(Some(0.1)))?, Ordering::Less);
        assert_eq!(
            DataValue::Float64(Some(-2.5))
                .compare(&DataValue::Decimal(Some(Decimal::from_str("-2.50").unwrap())))?,
            Ordering::Equal
        );
        assert_eq!(
            DataValue::Float64(Some(1e-300))
                .compare(&DataValue::Decimal(Some(Decimal::from_str("0.0000000000000000000000000001").unwrap())))?,
            Ordering::Less
        );

        Ok(())
    }

    #[test]
    fn test_compare_text_temporal_and_tuple() -> Result<(), DatabaseError> {
        assert_eq!(
            DataValue::from("B").compare(&DataValue::from("a"))?,
            Ordering::Less
        );
        assert_eq!(
            DataValue::Date32(Some(1)).compare(&DataValue::Date64(Some(86_400_000)))?,
            Ordering::Equal
        );
        assert_eq!(
            DataValue::Date32(Some(1)).compare(&DataValue::Date64(Some(86_400_001)))?,
            Ordering::Less
        );

        let tuple_1 = DataValue::Tuple(Some(vec![
            Arc::new(DataValue::Int32(Some(1))),
            Arc::new(DataValue::from("b")),
        ]));
        let tuple_2 = DataValue::Tuple(Some(vec![
            Arc::new(DataValue::Int32(Some(1))),
            Arc::new(DataValue::from("c")),
        ]));
        assert_eq!(tuple_1.compare(&tuple_2)?, Ordering::Less);

        Ok(())
    }

    #[test]
    fn test_compare_incomparable() {
        let result = DataValue::from("a").compare(&DataValue::Int32(Some(1)));

        assert!(matches!(
            result,
            Err(DatabaseError::ComparisonTypeError(
                LogicalType::Varchar(None),
                LogicalType::Integer
            ))
        ));
    }

    #[test]
    fn test_cast() -> Result<(), DatabaseError> {
        assert_eq!(
            DataValue::Int32(Some(7)).cast(&LogicalType::Bigint)?,
            DataValue::Int64(Some(7))
        );
        assert_eq!(
            DataValue::from("1970-01-02").cast(&LogicalType::Date)?,
            DataValue::Date32(Some(1))
        );
        assert_eq!(
            DataValue::Float64(Some(0.5)).cast(&LogicalType::Decimal(Some(15), Some(2)))?,
            DataValue::Decimal(Some(Decimal::from_str("0.50").unwrap()))
        );
        assert!(DataValue::Int64(Some(i64::MAX))
            .cast(&LogicalType::Integer)
            .is_err());

        Ok(())
    }
}
