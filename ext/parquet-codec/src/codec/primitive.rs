//! INT32, INT64, FLOAT and DOUBLE columns, including the narrower and
//! unsigned integer annotations stored in them.

use bytes::{BufMut, BytesMut};
use std::cmp::Ordering;
use std::marker::PhantomData;

use super::{read_fixed, source_range, ArrayPool, ColumnValue, DataCodec, PoolSet};
use crate::buffer::ReadCursor;
use crate::metadata::{ColumnAnnotation, SchemaElement, Type};
use crate::options::FormatOptions;
use crate::Result;

/// A value stored as a fixed-width little-endian primitive.
pub trait PlainPrimitive: ColumnValue + Copy + Default {
    const PHYSICAL: Type;
    const NAME: &'static str;

    fn matches_annotation(annotation: Option<ColumnAnnotation>) -> bool;

    fn read_plain(cursor: &mut ReadCursor, dest: &mut [Self], offset: usize) -> Result<usize>;

    fn write_plain(self, out: &mut BytesMut);

    fn compare(a: &Self, b: &Self) -> Ordering;
}

fn integer(annotation: Option<ColumnAnnotation>, bit_width: u8, signed: bool) -> bool {
    annotation == Some(ColumnAnnotation::Integer { bit_width, signed })
}

macro_rules! int32_primitive {
    ($ty:ty, $name:literal, $bits:literal, $signed:literal, $allow_plain:literal) => {
        impl PlainPrimitive for $ty {
            const PHYSICAL: Type = Type::INT32;
            const NAME: &'static str = $name;

            fn matches_annotation(annotation: Option<ColumnAnnotation>) -> bool {
                ($allow_plain && annotation.is_none()) || integer(annotation, $bits, $signed)
            }

            fn read_plain(cursor: &mut ReadCursor, dest: &mut [Self], offset: usize) -> Result<usize> {
                // Narrow and unsigned values are stored as the low bits of an INT32.
                read_fixed(cursor, dest, offset, |b: [u8; 4]| Ok(i32::from_le_bytes(b) as $ty))
            }

            fn write_plain(self, out: &mut BytesMut) {
                out.put_i32_le(self as i32);
            }

            fn compare(a: &Self, b: &Self) -> Ordering {
                a.cmp(b)
            }
        }
    };
}

int32_primitive!(i32, "Int32", 32, true, true);
int32_primitive!(i16, "Int16", 16, true, false);
int32_primitive!(i8, "Int8", 8, true, false);
int32_primitive!(u32, "UInt32", 32, false, false);
int32_primitive!(u16, "UInt16", 16, false, false);
int32_primitive!(u8, "UInt8", 8, false, false);

impl PlainPrimitive for i64 {
    const PHYSICAL: Type = Type::INT64;
    const NAME: &'static str = "Int64";

    fn matches_annotation(annotation: Option<ColumnAnnotation>) -> bool {
        annotation.is_none() || integer(annotation, 64, true)
    }

    fn read_plain(cursor: &mut ReadCursor, dest: &mut [Self], offset: usize) -> Result<usize> {
        read_fixed(cursor, dest, offset, |b: [u8; 8]| Ok(i64::from_le_bytes(b)))
    }

    fn write_plain(self, out: &mut BytesMut) {
        out.put_i64_le(self);
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl PlainPrimitive for u64 {
    const PHYSICAL: Type = Type::INT64;
    const NAME: &'static str = "UInt64";

    fn matches_annotation(annotation: Option<ColumnAnnotation>) -> bool {
        integer(annotation, 64, false)
    }

    fn read_plain(cursor: &mut ReadCursor, dest: &mut [Self], offset: usize) -> Result<usize> {
        read_fixed(cursor, dest, offset, |b: [u8; 8]| Ok(u64::from_le_bytes(b)))
    }

    fn write_plain(self, out: &mut BytesMut) {
        out.put_u64_le(self);
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }
}

impl PlainPrimitive for f32 {
    const PHYSICAL: Type = Type::FLOAT;
    const NAME: &'static str = "Float";

    fn matches_annotation(annotation: Option<ColumnAnnotation>) -> bool {
        annotation.is_none()
    }

    fn read_plain(cursor: &mut ReadCursor, dest: &mut [Self], offset: usize) -> Result<usize> {
        read_fixed(cursor, dest, offset, |b: [u8; 4]| Ok(f32::from_le_bytes(b)))
    }

    fn write_plain(self, out: &mut BytesMut) {
        out.put_f32_le(self);
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.total_cmp(b)
    }
}

impl PlainPrimitive for f64 {
    const PHYSICAL: Type = Type::DOUBLE;
    const NAME: &'static str = "Double";

    fn matches_annotation(annotation: Option<ColumnAnnotation>) -> bool {
        annotation.is_none()
    }

    fn read_plain(cursor: &mut ReadCursor, dest: &mut [Self], offset: usize) -> Result<usize> {
        read_fixed(cursor, dest, offset, |b: [u8; 8]| Ok(f64::from_le_bytes(b)))
    }

    fn write_plain(self, out: &mut BytesMut) {
        out.put_f64_le(self);
    }

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.total_cmp(b)
    }
}

/// Codec for any [`PlainPrimitive`] value type.
#[derive(Debug)]
pub struct PrimitiveCodec<P> {
    pool: ArrayPool<P>,
    _marker: PhantomData<P>,
}

impl<P: PlainPrimitive> PrimitiveCodec<P> {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: P::pool(pools).clone(),
            _marker: PhantomData,
        }
    }
}

impl<P: PlainPrimitive> DataCodec for PrimitiveCodec<P> {
    type Value = P;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(P::PHYSICAL) && P::matches_annotation(element.annotation())
    }

    fn name(&self) -> &'static str {
        P::NAME
    }

    fn pool(&self) -> &ArrayPool<P> {
        &self.pool
    }

    fn filler(&self) -> P {
        P::default()
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [P],
        offset: usize,
    ) -> Result<usize> {
        P::read_plain(cursor, dest, offset)
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[P],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let values = source_range(source, offset, count)?;
        out.reserve(values.len() * std::mem::size_of::<P>().max(4));
        for value in values {
            value.write_plain(out);
        }
        Ok(())
    }

    fn compare(&self, a: &P, b: &P) -> Ordering {
        P::compare(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ConvertedType, FieldRepetitionType};
    use crate::ParquetError;

    fn int32_element() -> SchemaElement {
        SchemaElement::new_leaf("v", Type::INT32, FieldRepetitionType::REQUIRED)
    }

    #[test]
    fn test_int32_read_write() {
        let codec = PrimitiveCodec::<i32>::new(&PoolSet::default());
        let element = int32_element();
        let mut out = BytesMut::new();
        codec.write(&mut out, &element, &[1, -2, i32::MAX], 0, 3).unwrap();
        assert_eq!(&out[..4], &[1, 0, 0, 0]);

        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = [0i32; 3];
        assert_eq!(codec.read(&mut cursor, &element, &mut dest, 0).unwrap(), 3);
        assert_eq!(dest, [1, -2, i32::MAX]);
    }

    #[test]
    fn test_uint32_reinterprets_bits() {
        let codec = PrimitiveCodec::<u32>::new(&PoolSet::default());
        let element = int32_element().with_converted_type(ConvertedType::UINT_32);
        let mut cursor = ReadCursor::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        let mut dest = [0u32; 1];
        codec.read(&mut cursor, &element, &mut dest, 0).unwrap();
        assert_eq!(dest[0], u32::MAX);
    }

    #[test]
    fn test_annotation_matching() {
        let options = FormatOptions::default();
        let plain = int32_element();
        let int8 = int32_element().with_converted_type(ConvertedType::INT_8);
        assert!(PrimitiveCodec::<i32>::is_match(&plain, &options));
        assert!(!PrimitiveCodec::<i8>::is_match(&plain, &options));
        assert!(PrimitiveCodec::<i8>::is_match(&int8, &options));
        assert!(!PrimitiveCodec::<i32>::is_match(&int8, &options));
        assert!(!PrimitiveCodec::<i64>::is_match(&plain, &options));
    }

    #[test]
    fn test_read_limited_by_capacity_and_offset() {
        let codec = PrimitiveCodec::<i64>::new(&PoolSet::default());
        let element = SchemaElement::new_leaf("v", Type::INT64, FieldRepetitionType::REQUIRED);
        let mut out = BytesMut::new();
        codec.write(&mut out, &element, &[10, 20, 30], 0, 3).unwrap();
        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = [0i64; 3];
        assert_eq!(codec.read(&mut cursor, &element, &mut dest, 1).unwrap(), 2);
        assert_eq!(dest, [0, 10, 20]);
        assert_eq!(cursor.remaining(), 8);
    }

    #[test]
    fn test_truncated_value_is_underflow() {
        let codec = PrimitiveCodec::<f64>::new(&PoolSet::default());
        let element = SchemaElement::new_leaf("v", Type::DOUBLE, FieldRepetitionType::REQUIRED);
        let mut cursor = ReadCursor::new(vec![0u8; 12]);
        let mut dest = [0f64; 2];
        let err = codec.read(&mut cursor, &element, &mut dest, 0).unwrap_err();
        assert!(matches!(err, ParquetError::BufferUnderflow { .. }));
    }

    #[test]
    fn test_float_total_order() {
        let codec = PrimitiveCodec::<f32>::new(&PoolSet::default());
        assert_eq!(codec.compare(&-0.0, &0.0), Ordering::Less);
        assert_eq!(codec.compare(&1.0, &f32::NAN), Ordering::Less);
        assert!(codec.equals(&f32::NAN, &f32::NAN));
    }

    #[test]
    fn test_empty_input_reads_nothing() {
        let codec = PrimitiveCodec::<i32>::new(&PoolSet::default());
        let mut cursor = ReadCursor::new(Vec::new());
        let mut dest: [i32; 0] = [];
        assert_eq!(codec.read(&mut cursor, &int32_element(), &mut dest, 0).unwrap(), 0);
    }
}
