use bytes::Bytes;
use ordered_float::OrderedFloat;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::pool::{ArrayPool, PooledArray};
use crate::value::{Decimal, Interval, ParquetValue};
use crate::{ParquetError, Result};

/// Backing buffer of a [`TypedArray`].
#[derive(Debug)]
pub enum ArrayStorage<T> {
    Owned(Vec<T>),
    Pooled(PooledArray<T>),
}

/// Homogeneous column values with optional explicit validity.
///
/// Null slots hold an unspecified filler value; only `validity` says
/// whether a slot is present.
#[derive(Debug)]
pub struct TypedArray<T> {
    storage: ArrayStorage<T>,
    validity: Option<Vec<bool>>,
}

impl<T> TypedArray<T> {
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            storage: ArrayStorage::Owned(values),
            validity: None,
        }
    }

    pub fn from_pooled(values: PooledArray<T>) -> Self {
        Self {
            storage: ArrayStorage::Pooled(values),
            validity: None,
        }
    }

    /// Attaches a validity vector, one flag per slot.
    pub fn with_validity(mut self, validity: Vec<bool>) -> Result<Self> {
        if validity.len() != self.len() {
            return Err(ParquetError::invalid_argument(format!(
                "validity has {} entries for {} values",
                validity.len(),
                self.len()
            )));
        }
        self.validity = Some(validity);
        Ok(self)
    }

    /// Marks every slot null.
    pub fn with_all_null(mut self) -> Self {
        self.validity = Some(vec![false; self.len()]);
        self
    }

    pub fn values(&self) -> &[T] {
        match &self.storage {
            ArrayStorage::Owned(v) => v,
            ArrayStorage::Pooled(p) => p,
        }
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        match &mut self.storage {
            ArrayStorage::Owned(v) => v,
            ArrayStorage::Pooled(p) => p,
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self.storage, ArrayStorage::Pooled(_))
    }

    pub fn pool_id(&self) -> Option<u64> {
        match &self.storage {
            ArrayStorage::Owned(_) => None,
            ArrayStorage::Pooled(p) => Some(p.pool_id()),
        }
    }

    pub fn validity(&self) -> Option<&[bool]> {
        self.validity.as_deref()
    }

    pub fn validity_mut(&mut self) -> Option<&mut [bool]> {
        self.validity.as_deref_mut()
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        match &self.validity {
            Some(v) => v.get(idx).copied().unwrap_or(false),
            None => idx < self.len(),
        }
    }

    pub fn null_count(&self) -> usize {
        self.validity
            .as_ref()
            .map(|v| v.iter().filter(|valid| !**valid).count())
            .unwrap_or(0)
    }

    /// The value at `idx`, `None` when null or out of bounds.
    pub fn get(&self, idx: usize) -> Option<&T> {
        if self.is_valid(idx) {
            self.values().get(idx)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn into_storage(self) -> ArrayStorage<T> {
        self.storage
    }
}

impl<T: Clone> TypedArray<T> {
    /// Builds a nullable array; `None` slots are set to `filler`.
    pub fn from_options(values: Vec<Option<T>>, filler: T) -> Self {
        let validity = values.iter().map(Option::is_some).collect();
        let values = values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| filler.clone()))
            .collect();
        Self {
            storage: ArrayStorage::Owned(values),
            validity: Some(validity),
        }
    }

    pub fn to_options(&self) -> Vec<Option<T>> {
        self.iter().map(|v| v.cloned()).collect()
    }
}

impl<T: Clone> Clone for TypedArray<T> {
    /// Clones into an owned array; pooled buffers are never shared.
    fn clone(&self) -> Self {
        Self {
            storage: ArrayStorage::Owned(self.values().to_vec()),
            validity: self.validity.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for TypedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.values() == other.values() && self.validity == other.validity
    }
}

/// One pool per value type, shared by every codec that produces it.
#[derive(Debug, Clone, Default)]
pub struct PoolSet {
    pub boolean: ArrayPool<bool>,
    pub int8: ArrayPool<i8>,
    pub int16: ArrayPool<i16>,
    pub int32: ArrayPool<i32>,
    pub int64: ArrayPool<i64>,
    pub uint8: ArrayPool<u8>,
    pub uint16: ArrayPool<u16>,
    pub uint32: ArrayPool<u32>,
    pub uint64: ArrayPool<u64>,
    pub float: ArrayPool<f32>,
    pub double: ArrayPool<f64>,
    pub decimal: ArrayPool<Decimal>,
    pub date: ArrayPool<jiff::civil::Date>,
    pub timestamp: ArrayPool<jiff::Timestamp>,
    pub time: ArrayPool<jiff::civil::Time>,
    pub interval: ArrayPool<Interval>,
    pub bytes: ArrayPool<Bytes>,
    pub string: ArrayPool<Arc<str>>,
    pub uuid: ArrayPool<Uuid>,
}

impl PoolSet {
    pub fn new(retention: usize) -> Self {
        Self {
            boolean: ArrayPool::new(retention),
            int8: ArrayPool::new(retention),
            int16: ArrayPool::new(retention),
            int32: ArrayPool::new(retention),
            int64: ArrayPool::new(retention),
            uint8: ArrayPool::new(retention),
            uint16: ArrayPool::new(retention),
            uint32: ArrayPool::new(retention),
            uint64: ArrayPool::new(retention),
            float: ArrayPool::new(retention),
            double: ArrayPool::new(retention),
            decimal: ArrayPool::new(retention),
            date: ArrayPool::new(retention),
            timestamp: ArrayPool::new(retention),
            time: ArrayPool::new(retention),
            interval: ArrayPool::new(retention),
            bytes: ArrayPool::new(retention),
            string: ArrayPool::new(retention),
            uuid: ArrayPool::new(retention),
        }
    }

    /// Rented buffers across all pools.
    pub fn outstanding(&self) -> usize {
        self.boolean.outstanding()
            + self.int8.outstanding()
            + self.int16.outstanding()
            + self.int32.outstanding()
            + self.int64.outstanding()
            + self.uint8.outstanding()
            + self.uint16.outstanding()
            + self.uint32.outstanding()
            + self.uint64.outstanding()
            + self.float.outstanding()
            + self.double.outstanding()
            + self.decimal.outstanding()
            + self.date.outstanding()
            + self.timestamp.outstanding()
            + self.time.outstanding()
            + self.interval.outstanding()
            + self.bytes.outstanding()
            + self.string.outstanding()
            + self.uuid.outstanding()
    }
}

/// A value type that has a [`ColumnArray`] variant and a pool.
pub trait ColumnValue: Clone + Send + Sync + fmt::Debug + 'static {
    const TYPE_NAME: &'static str;

    fn into_column(array: TypedArray<Self>) -> ColumnArray;

    fn from_column(column: &ColumnArray) -> Option<&TypedArray<Self>>;

    fn from_column_mut(column: &mut ColumnArray) -> Option<&mut TypedArray<Self>>;

    fn pool(pools: &PoolSet) -> &ArrayPool<Self>;

    fn to_value(&self) -> ParquetValue;
}

/// Type-erased column values, one variant per value type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnArray {
    Boolean(TypedArray<bool>),
    Int8(TypedArray<i8>),
    Int16(TypedArray<i16>),
    Int32(TypedArray<i32>),
    Int64(TypedArray<i64>),
    UInt8(TypedArray<u8>),
    UInt16(TypedArray<u16>),
    UInt32(TypedArray<u32>),
    UInt64(TypedArray<u64>),
    Float(TypedArray<f32>),
    Double(TypedArray<f64>),
    Decimal(TypedArray<Decimal>),
    Date(TypedArray<jiff::civil::Date>),
    Timestamp(TypedArray<jiff::Timestamp>),
    Time(TypedArray<jiff::civil::Time>),
    Interval(TypedArray<Interval>),
    Bytes(TypedArray<Bytes>),
    String(TypedArray<Arc<str>>),
    Uuid(TypedArray<Uuid>),
}

macro_rules! impl_column_value {
    ($ty:ty, $variant:ident, $pool:ident, |$v:ident| $to_value:expr) => {
        impl ColumnValue for $ty {
            const TYPE_NAME: &'static str = stringify!($variant);

            fn into_column(array: TypedArray<Self>) -> ColumnArray {
                ColumnArray::$variant(array)
            }

            fn from_column(column: &ColumnArray) -> Option<&TypedArray<Self>> {
                match column {
                    ColumnArray::$variant(a) => Some(a),
                    _ => None,
                }
            }

            fn from_column_mut(column: &mut ColumnArray) -> Option<&mut TypedArray<Self>> {
                match column {
                    ColumnArray::$variant(a) => Some(a),
                    _ => None,
                }
            }

            fn pool(pools: &PoolSet) -> &ArrayPool<Self> {
                &pools.$pool
            }

            fn to_value(&self) -> ParquetValue {
                let $v = self;
                $to_value
            }
        }
    };
}

impl_column_value!(bool, Boolean, boolean, |v| ParquetValue::Boolean(*v));
impl_column_value!(i8, Int8, int8, |v| ParquetValue::Int8(*v));
impl_column_value!(i16, Int16, int16, |v| ParquetValue::Int16(*v));
impl_column_value!(i32, Int32, int32, |v| ParquetValue::Int32(*v));
impl_column_value!(i64, Int64, int64, |v| ParquetValue::Int64(*v));
impl_column_value!(u8, UInt8, uint8, |v| ParquetValue::UInt8(*v));
impl_column_value!(u16, UInt16, uint16, |v| ParquetValue::UInt16(*v));
impl_column_value!(u32, UInt32, uint32, |v| ParquetValue::UInt32(*v));
impl_column_value!(u64, UInt64, uint64, |v| ParquetValue::UInt64(*v));
impl_column_value!(f32, Float, float, |v| ParquetValue::Float32(OrderedFloat(*v)));
impl_column_value!(f64, Double, double, |v| ParquetValue::Float64(OrderedFloat(*v)));
impl_column_value!(Decimal, Decimal, decimal, |v| ParquetValue::Decimal(v.clone()));
impl_column_value!(jiff::civil::Date, Date, date, |v| ParquetValue::Date(*v));
impl_column_value!(jiff::Timestamp, Timestamp, timestamp, |v| ParquetValue::Timestamp(*v));
impl_column_value!(jiff::civil::Time, Time, time, |v| ParquetValue::Time(*v));
impl_column_value!(Interval, Interval, interval, |v| ParquetValue::Interval(*v));
impl_column_value!(Bytes, Bytes, bytes, |v| ParquetValue::Bytes(v.clone()));
impl_column_value!(Arc<str>, String, string, |v| ParquetValue::String(Arc::clone(v)));
impl_column_value!(Uuid, Uuid, uuid, |v| ParquetValue::Uuid(*v));

/// Runs `$body` with `$a` bound to the inner `TypedArray` of any variant.
macro_rules! with_column_array {
    ($array:expr, $a:ident => $body:expr) => {
        match $array {
            ColumnArray::Boolean($a) => $body,
            ColumnArray::Int8($a) => $body,
            ColumnArray::Int16($a) => $body,
            ColumnArray::Int32($a) => $body,
            ColumnArray::Int64($a) => $body,
            ColumnArray::UInt8($a) => $body,
            ColumnArray::UInt16($a) => $body,
            ColumnArray::UInt32($a) => $body,
            ColumnArray::UInt64($a) => $body,
            ColumnArray::Float($a) => $body,
            ColumnArray::Double($a) => $body,
            ColumnArray::Decimal($a) => $body,
            ColumnArray::Date($a) => $body,
            ColumnArray::Timestamp($a) => $body,
            ColumnArray::Time($a) => $body,
            ColumnArray::Interval($a) => $body,
            ColumnArray::Bytes($a) => $body,
            ColumnArray::String($a) => $body,
            ColumnArray::Uuid($a) => $body,
        }
    };
}

impl ColumnArray {
    pub fn len(&self) -> usize {
        with_column_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        with_column_array!(self, a => a.null_count())
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        with_column_array!(self, a => a.is_valid(idx))
    }

    pub fn is_pooled(&self) -> bool {
        with_column_array!(self, a => a.is_pooled())
    }

    pub fn validity(&self) -> Option<&[bool]> {
        with_column_array!(self, a => a.validity())
    }

    /// Variant name, e.g. `"Int32"`.
    pub fn type_name(&self) -> &'static str {
        fn name_of<T: ColumnValue>(_: &TypedArray<T>) -> &'static str {
            T::TYPE_NAME
        }
        with_column_array!(self, a => name_of(a))
    }

    /// Scalar view of slot `idx`; null slots yield [`ParquetValue::Null`].
    pub fn value(&self, idx: usize) -> Option<ParquetValue> {
        if idx >= self.len() {
            return None;
        }
        Some(with_column_array!(self, a => a
            .get(idx)
            .map(ColumnValue::to_value)
            .unwrap_or(ParquetValue::Null)))
    }

    pub fn to_values(&self) -> Vec<ParquetValue> {
        (0..self.len()).filter_map(|i| self.value(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_and_get() {
        let array = TypedArray::from_options(vec![Some(1), None, Some(3)], 0);
        assert_eq!(array.len(), 3);
        assert_eq!(array.null_count(), 1);
        assert_eq!(array.get(0), Some(&1));
        assert_eq!(array.get(1), None);
        assert_eq!(array.get(5), None);
        assert_eq!(array.to_options(), vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn test_validity_length_checked() {
        let err = TypedArray::from_vec(vec![1, 2]).with_validity(vec![true]).unwrap_err();
        assert!(matches!(err, ParquetError::InvalidArgument(_)));
    }

    #[test]
    fn test_column_array_scalar_view() {
        let column = ColumnArray::String(TypedArray::from_options(
            vec![Some(Arc::from("a")), None],
            Arc::from(""),
        ));
        assert_eq!(column.type_name(), "String");
        assert_eq!(column.value(0), Some(ParquetValue::String(Arc::from("a"))));
        assert_eq!(column.value(1), Some(ParquetValue::Null));
        assert_eq!(column.value(2), None);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn test_clone_of_pooled_is_owned() {
        let pools = PoolSet::new(2);
        let array = TypedArray::from_pooled(pools.int32.rent(2, &9));
        let copy = array.clone();
        assert!(array.is_pooled());
        assert!(!copy.is_pooled());
        assert_eq!(copy.values(), &[9, 9]);
        drop(array);
        assert_eq!(pools.outstanding(), 0);
    }
}
