//! Per-type PLAIN codecs.
//!
//! Every supported column type has one codec implementing [`DataCodec`].
//! [`CodecRegistry`] picks the single codec matching a schema element and
//! hands it out as an [`AnyCodec`], which dispatches to the concrete codec
//! without further lookups.

mod array;
mod binary;
mod boolean;
mod decimal;
pub mod definitions;
mod pool;
mod primitive;
mod registry;
mod temporal;

pub use array::{ArrayStorage, ColumnArray, ColumnValue, PoolSet, TypedArray};
pub use binary::{ByteArrayCodec, FixedLenByteArrayCodec, StringCodec, UuidCodec};
pub use boolean::BooleanCodec;
pub use decimal::DecimalCodec;
pub use definitions::PackedValues;
pub use pool::{ArrayPool, PooledArray};
pub use primitive::{PlainPrimitive, PrimitiveCodec};
pub use registry::{AnyCodec, CodecRegistry, PackedColumn};
pub use temporal::{DateCodec, Int96Codec, IntervalCodec, TimeCodec, TimestampCodec};

use bytes::{Bytes, BytesMut};
use std::cmp::Ordering;
use std::fmt;

use crate::buffer::ReadCursor;
use crate::metadata::SchemaElement;
use crate::options::FormatOptions;
use crate::{ParquetError, Result};

/// Converts between PLAIN bytes and typed values for one column type.
pub trait DataCodec: Send + Sync + fmt::Debug {
    type Value: ColumnValue;

    /// Whether this codec handles columns described by `element`.
    fn is_match(element: &SchemaElement, options: &FormatOptions) -> bool
    where
        Self: Sized;

    fn name(&self) -> &'static str;

    fn pool(&self) -> &ArrayPool<Self::Value>;

    /// Value placed in slots that hold nothing (nulls, fresh buffers).
    fn filler(&self) -> Self::Value;

    fn allocate(
        &self,
        min_count: usize,
        use_pool: bool,
        is_nullable: bool,
    ) -> TypedArray<Self::Value> {
        let filler = self.filler();
        let array = if use_pool {
            TypedArray::from_pooled(self.pool().rent(min_count, &filler))
        } else {
            TypedArray::from_vec(vec![filler; min_count])
        };
        if is_nullable {
            array.with_all_null()
        } else {
            array
        }
    }

    /// Decodes values into `dest[offset..]` until `dest` is full or the
    /// cursor is exhausted. Returns the number of values written.
    fn read(
        &self,
        cursor: &mut ReadCursor,
        element: &SchemaElement,
        dest: &mut [Self::Value],
        offset: usize,
    ) -> Result<usize>;

    /// Appends `source[offset..offset + count]` PLAIN encoded to `out`.
    fn write(
        &self,
        out: &mut BytesMut,
        element: &SchemaElement,
        source: &[Self::Value],
        offset: usize,
        count: usize,
    ) -> Result<()>;

    fn pack_definitions(
        &self,
        values: &TypedArray<Self::Value>,
        offset: usize,
        count: usize,
        max_definition_level: i16,
    ) -> Result<PackedValues<Self::Value>> {
        definitions::pack(values, offset, count, max_definition_level)
    }

    fn unpack_definitions(
        &self,
        packed: &[Self::Value],
        levels: &[i16],
        max_definition_level: i16,
    ) -> Result<TypedArray<Self::Value>> {
        definitions::unpack(packed, levels, max_definition_level, &self.filler())
    }

    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Ordering;

    fn equals(&self, a: &Self::Value, b: &Self::Value) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// Decodes a single statistics value. `None` in gives `None` out.
    fn plain_decode(
        &self,
        element: &SchemaElement,
        encoded: Option<&[u8]>,
    ) -> Result<Option<Self::Value>> {
        let Some(encoded) = encoded else {
            return Ok(None);
        };
        let mut cursor = ReadCursor::new(Bytes::copy_from_slice(encoded));
        let mut dest = [self.filler()];
        match self.read(&mut cursor, element, &mut dest, 0)? {
            0 => Ok(None),
            _ => {
                let [value] = dest;
                Ok(Some(value))
            }
        }
    }
}

/// Free slots in `dest` starting at `offset`.
pub(crate) fn capacity<T>(dest: &[T], offset: usize) -> Result<usize> {
    dest.len().checked_sub(offset).ok_or_else(|| {
        ParquetError::invalid_argument(format!(
            "offset {} past destination of {} values",
            offset,
            dest.len()
        ))
    })
}

/// `source[offset..offset + count]`, bounds checked.
pub(crate) fn source_range<T>(source: &[T], offset: usize, count: usize) -> Result<&[T]> {
    offset
        .checked_add(count)
        .and_then(|end| source.get(offset..end))
        .ok_or_else(|| {
            ParquetError::invalid_argument(format!(
                "range {}+{} out of bounds for {} values",
                offset,
                count,
                source.len()
            ))
        })
}

/// Reads fixed-width values. A trailing partial value is an underflow.
pub(crate) fn read_fixed<T, const N: usize>(
    cursor: &mut ReadCursor,
    dest: &mut [T],
    offset: usize,
    mut decode: impl FnMut([u8; N]) -> Result<T>,
) -> Result<usize> {
    let capacity = capacity(dest, offset)?;
    if cursor.is_empty() || capacity == 0 {
        return Ok(0);
    }
    let whole = cursor.remaining() / N;
    if whole < capacity && cursor.remaining() % N != 0 {
        return Err(ParquetError::underflow(
            cursor.position() + whole * N,
            N,
            cursor.remaining() % N,
        ));
    }
    let count = whole.min(capacity);
    for slot in &mut dest[offset..offset + count] {
        *slot = decode(cursor.read_array::<N>()?)?;
    }
    Ok(count)
}
