use bytes::{BufMut, BytesMut};
use num::{BigInt, Signed, ToPrimitive};
use std::cmp::Ordering;

use super::{capacity, read_fixed, source_range, ArrayPool, DataCodec, PoolSet};
use crate::buffer::ReadCursor;
use crate::metadata::{ColumnAnnotation, SchemaElement, Type};
use crate::options::FormatOptions;
use crate::value::Decimal;
use crate::{ParquetError, Result};

/// DECIMAL columns in any of their four physical layouts.
///
/// INT32 and INT64 hold the unscaled value little-endian. FIXED_LEN_BYTE_ARRAY
/// and BYTE_ARRAY hold it as big-endian two's complement, the latter with the
/// usual length prefix.
#[derive(Debug)]
pub struct DecimalCodec {
    precision: i32,
    scale: i32,
    pool: ArrayPool<Decimal>,
}

impl DecimalCodec {
    pub fn new(precision: i32, scale: i32, pools: &PoolSet) -> Self {
        Self {
            precision,
            scale,
            pool: pools.decimal.clone(),
        }
    }

    pub fn precision(&self) -> i32 {
        self.precision
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    fn decimal(&self, unscaled: impl Into<BigInt>) -> Decimal {
        Decimal::new(unscaled, self.scale)
    }

    /// Unscaled value of `value` at the column's scale.
    fn unscaled(&self, value: &Decimal) -> Result<BigInt> {
        match value.scale.cmp(&self.scale) {
            Ordering::Equal => Ok(value.unscaled.clone()),
            Ordering::Less => {
                let diff = (self.scale - value.scale) as usize;
                Ok(&value.unscaled * num::pow(BigInt::from(10), diff))
            }
            Ordering::Greater => Err(ParquetError::conversion(format!(
                "decimal {} has scale {} but column scale is {}",
                value, value.scale, self.scale
            ))),
        }
    }

    fn overflow(&self, value: &Decimal, target: &str) -> ParquetError {
        ParquetError::conversion(format!(
            "decimal {} does not fit {} (precision {}, scale {})",
            value, target, self.precision, self.scale
        ))
    }

    fn read_fixed_width(
        &self,
        cursor: &mut ReadCursor,
        dest: &mut [Decimal],
        offset: usize,
        width: usize,
    ) -> Result<usize> {
        let capacity = capacity(dest, offset)?;
        if cursor.is_empty() || capacity == 0 {
            return Ok(0);
        }
        let whole = cursor.remaining() / width;
        if whole < capacity && cursor.remaining() % width != 0 {
            return Err(ParquetError::underflow(
                cursor.position() + whole * width,
                width,
                cursor.remaining() % width,
            ));
        }
        let count = whole.min(capacity);
        for slot in &mut dest[offset..offset + count] {
            *slot = self.decimal(BigInt::from_signed_bytes_be(cursor.read_slice(width)?));
        }
        Ok(count)
    }
}

fn type_length(element: &SchemaElement) -> Result<usize> {
    match element.type_length {
        Some(len) if len > 0 => Ok(len as usize),
        other => Err(ParquetError::schema(format!(
            "decimal column '{}' has invalid type_length {:?}",
            element.name, other
        ))),
    }
}

fn physical(element: &SchemaElement) -> Result<Type> {
    element
        .physical_type
        .ok_or_else(|| ParquetError::schema(format!("'{}' is not a leaf column", element.name)))
}

/// Big-endian two's complement of `value` sign-extended to `width` bytes.
fn to_fixed_bytes(value: &BigInt, width: usize) -> Option<Vec<u8>> {
    let bytes = value.to_signed_bytes_be();
    if bytes.len() > width {
        return None;
    }
    let pad = if value.is_negative() { 0xFF } else { 0x00 };
    let mut out = vec![pad; width - bytes.len()];
    out.extend_from_slice(&bytes);
    Some(out)
}

impl DataCodec for DecimalCodec {
    type Value = Decimal;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        matches!(element.annotation(), Some(ColumnAnnotation::Decimal { .. }))
            && matches!(
                element.physical_type,
                Some(Type::INT32 | Type::INT64 | Type::FIXED_LEN_BYTE_ARRAY | Type::BYTE_ARRAY)
            )
    }

    fn name(&self) -> &'static str {
        "Decimal"
    }

    fn pool(&self) -> &ArrayPool<Decimal> {
        &self.pool
    }

    fn filler(&self) -> Decimal {
        Decimal::new(0, self.scale)
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        element: &SchemaElement,
        dest: &mut [Decimal],
        offset: usize,
    ) -> Result<usize> {
        match physical(element)? {
            Type::INT32 => read_fixed(cursor, dest, offset, |b: [u8; 4]| {
                Ok(self.decimal(i32::from_le_bytes(b)))
            }),
            Type::INT64 => read_fixed(cursor, dest, offset, |b: [u8; 8]| {
                Ok(self.decimal(i64::from_le_bytes(b)))
            }),
            Type::FIXED_LEN_BYTE_ARRAY => {
                self.read_fixed_width(cursor, dest, offset, type_length(element)?)
            }
            Type::BYTE_ARRAY => {
                let capacity = capacity(dest, offset)?;
                let mut filled = 0;
                while filled < capacity && !cursor.is_empty() {
                    let len = cursor.read_u32_le()? as usize;
                    let unscaled = BigInt::from_signed_bytes_be(cursor.read_slice(len)?);
                    dest[offset + filled] = self.decimal(unscaled);
                    filled += 1;
                }
                Ok(filled)
            }
            other => Err(ParquetError::schema(format!(
                "decimal column '{}' cannot be stored as {}",
                element.name, other
            ))),
        }
    }

    fn write(
        &self,
        out: &mut BytesMut,
        element: &SchemaElement,
        source: &[Decimal],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let values = source_range(source, offset, count)?;
        let physical = physical(element)?;
        for value in values {
            let unscaled = self.unscaled(value)?;
            match physical {
                Type::INT32 => {
                    let v = unscaled.to_i32().ok_or_else(|| self.overflow(value, "INT32"))?;
                    out.put_i32_le(v);
                }
                Type::INT64 => {
                    let v = unscaled.to_i64().ok_or_else(|| self.overflow(value, "INT64"))?;
                    out.put_i64_le(v);
                }
                Type::FIXED_LEN_BYTE_ARRAY => {
                    let width = type_length(element)?;
                    let bytes = to_fixed_bytes(&unscaled, width)
                        .ok_or_else(|| self.overflow(value, "FIXED_LEN_BYTE_ARRAY"))?;
                    out.put_slice(&bytes);
                }
                Type::BYTE_ARRAY => {
                    let bytes = unscaled.to_signed_bytes_be();
                    out.put_u32_le(bytes.len() as u32);
                    out.put_slice(&bytes);
                }
                other => {
                    return Err(ParquetError::schema(format!(
                        "decimal column '{}' cannot be stored as {}",
                        element.name, other
                    )))
                }
            }
        }
        Ok(())
    }

    fn compare(&self, a: &Decimal, b: &Decimal) -> Ordering {
        a.cmp_value(b)
    }

    fn plain_decode(&self, element: &SchemaElement, encoded: Option<&[u8]>) -> Result<Option<Decimal>> {
        match (physical(element)?, encoded) {
            (_, None) => Ok(None),
            // Statistics drop the length prefix.
            (Type::BYTE_ARRAY, Some([])) => Ok(None),
            (Type::BYTE_ARRAY, Some(bytes)) => Ok(Some(self.decimal(BigInt::from_signed_bytes_be(bytes)))),
            (_, Some(bytes)) => {
                let mut cursor = ReadCursor::new(bytes::Bytes::copy_from_slice(bytes));
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
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ConvertedType, FieldRepetitionType};

    fn element(physical: Type) -> SchemaElement {
        SchemaElement::new_leaf("price", physical, FieldRepetitionType::OPTIONAL)
            .with_converted_type(ConvertedType::DECIMAL)
            .with_decimal(9, 2)
    }

    fn codec() -> DecimalCodec {
        DecimalCodec::new(9, 2, &PoolSet::default())
    }

    #[test]
    fn test_int32_layout() {
        let mut out = BytesMut::new();
        let element = element(Type::INT32);
        codec()
            .write(&mut out, &element, &[Decimal::new(12345, 2)], 0, 1)
            .unwrap();
        assert_eq!(&out[..], &12345i32.to_le_bytes());

        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = [codec().filler()];
        codec().read(&mut cursor, &element, &mut dest, 0).unwrap();
        assert_eq!(dest[0].to_string(), "123.45");
    }

    #[test]
    fn test_fixed_len_sign_extension() {
        let element = element(Type::FIXED_LEN_BYTE_ARRAY).with_type_length(4);
        let mut out = BytesMut::new();
        codec()
            .write(&mut out, &element, &[Decimal::new(-1, 2), Decimal::new(256, 2)], 0, 2)
            .unwrap();
        assert_eq!(&out[..], &[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x01, 0x00]);

        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = vec![codec().filler(); 2];
        assert_eq!(codec().read(&mut cursor, &element, &mut dest, 0).unwrap(), 2);
        assert_eq!(dest, vec![Decimal::new(-1, 2), Decimal::new(256, 2)]);
    }

    #[test]
    fn test_write_rescales_up() {
        let element = element(Type::INT64);
        let mut out = BytesMut::new();
        codec().write(&mut out, &element, &[Decimal::new(15, 1)], 0, 1).unwrap();
        assert_eq!(&out[..], &150i64.to_le_bytes());
    }

    #[test]
    fn test_write_rejects_lost_precision() {
        let element = element(Type::INT64);
        let mut out = BytesMut::new();
        let err = codec()
            .write(&mut out, &element, &[Decimal::new(1234, 3)], 0, 1)
            .unwrap_err();
        assert!(matches!(err, ParquetError::Conversion(_)));
    }

    #[test]
    fn test_int32_overflow() {
        let element = element(Type::INT32);
        let mut out = BytesMut::new();
        let err = codec()
            .write(&mut out, &element, &[Decimal::new(i64::from(i32::MAX) + 1, 2)], 0, 1)
            .unwrap_err();
        assert!(matches!(err, ParquetError::Conversion(_)));
    }

    #[test]
    fn test_byte_array_statistics() {
        let element = element(Type::BYTE_ARRAY);
        let decoded = codec().plain_decode(&element, Some(&[0x01, 0x00][..])).unwrap();
        assert_eq!(decoded, Some(Decimal::new(256, 2)));
        assert_eq!(codec().plain_decode(&element, Some(&[][..])).unwrap(), None);
    }

    #[test]
    fn test_compare_numeric_across_scales() {
        assert_eq!(
            codec().compare(&Decimal::new(10, 1), &Decimal::new(100, 2)),
            Ordering::Equal
        );
        assert_eq!(
            codec().compare(&Decimal::new(-5, 0), &Decimal::new(1, 3)),
            Ordering::Less
        );
    }
}
