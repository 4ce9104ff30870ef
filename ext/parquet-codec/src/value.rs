use bytes::Bytes;
use num::{BigInt, Signed, Zero};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Arbitrary-precision decimal: `unscaled * 10^-scale`.
///
/// `Eq` is structural, so `1.0` (10, scale 1) and `1.00` (100, scale 2)
/// are different values that compare `Equal` under [`Decimal::cmp_value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub unscaled: BigInt,
    pub scale: i32,
}

impl Decimal {
    pub fn new<I: Into<BigInt>>(unscaled: I, scale: i32) -> Self {
        Decimal {
            unscaled: unscaled.into(),
            scale,
        }
    }

    /// Unscaled value brought to `scale`, which must be >= `self.scale`.
    fn rescaled(&self, scale: i32) -> BigInt {
        let diff = (scale - self.scale) as usize;
        if diff == 0 {
            self.unscaled.clone()
        } else {
            &self.unscaled * num::pow(BigInt::from(10), diff)
        }
    }

    /// Numeric comparison across scales.
    pub fn cmp_value(&self, other: &Decimal) -> Ordering {
        if self.scale == other.scale {
            return self.unscaled.cmp(&other.unscaled);
        }
        let scale = self.scale.max(other.scale);
        self.rescaled(scale).cmp(&other.rescaled(scale))
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_value(other).then(self.scale.cmp(&other.scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            return write!(f, "{}", self.rescaled(0));
        }
        let digits = self.unscaled.abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.unscaled.is_negative() { "-" } else { "" };
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int, frac)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal {
            unscaled: BigInt::zero(),
            scale: 0,
        }
    }
}

/// Calendar interval stored as three unsigned little-endian counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Interval {
    pub months: u32,
    pub days: u32,
    pub millis: u32,
}

impl Interval {
    pub fn new(months: u32, days: u32, millis: u32) -> Self {
        Interval {
            months,
            days,
            millis,
        }
    }
}

/// One logical value as it appears in statistics and scalar views of a column.
/// Null slots surface as [`ParquetValue::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParquetValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(OrderedFloat<f32>),
    Float64(OrderedFloat<f64>),
    Boolean(bool),
    String(Arc<str>),
    Bytes(Bytes),
    Uuid(Uuid),
    Decimal(Decimal),
    Date(jiff::civil::Date),
    Time(jiff::civil::Time),
    Timestamp(jiff::Timestamp),
    Interval(Interval),
    Null,
}

impl ParquetValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParquetValue::Null)
    }
}
