//! BYTE_ARRAY and FIXED_LEN_BYTE_ARRAY columns: strings, raw bytes and
//! UUIDs.

use bytes::{BufMut, Bytes, BytesMut};
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use super::{capacity, read_fixed, source_range, ArrayPool, DataCodec, PoolSet};
use crate::buffer::ReadCursor;
use crate::metadata::{ColumnAnnotation, SchemaElement, Type};
use crate::options::FormatOptions;
use crate::{ParquetError, Result};

/// Reads `u32` length-prefixed values until `dest` is full or input ends.
fn read_length_prefixed<T>(
    cursor: &mut ReadCursor,
    dest: &mut [T],
    offset: usize,
    mut convert: impl FnMut(Bytes) -> Result<T>,
) -> Result<usize> {
    let capacity = capacity(dest, offset)?;
    let mut filled = 0;
    while filled < capacity && !cursor.is_empty() {
        let len = cursor.read_u32_le()? as usize;
        let bytes = cursor.read_bytes(len)?;
        dest[offset + filled] = convert(bytes)?;
        filled += 1;
    }
    Ok(filled)
}

fn write_length_prefixed(out: &mut BytesMut, value: &[u8]) -> Result<()> {
    let len = u32::try_from(value.len()).map_err(|_| {
        ParquetError::invalid_argument(format!("byte array of {} bytes is too long", value.len()))
    })?;
    out.reserve(4 + value.len());
    out.put_u32_le(len);
    out.put_slice(value);
    Ok(())
}

fn fixed_length(element: &SchemaElement) -> Result<usize> {
    match element.type_length {
        Some(len) if len > 0 => Ok(len as usize),
        other => Err(ParquetError::schema(format!(
            "FIXED_LEN_BYTE_ARRAY column '{}' has invalid type_length {:?}",
            element.name, other
        ))),
    }
}

/// UTF-8 text stored as BYTE_ARRAY.
#[derive(Debug)]
pub struct StringCodec {
    pool: ArrayPool<Arc<str>>,
    lossy: bool,
    empty: Arc<str>,
}

impl StringCodec {
    pub fn new(pools: &PoolSet, options: &FormatOptions) -> Self {
        Self {
            pool: pools.string.clone(),
            lossy: options.lossy_utf8,
            empty: Arc::from(""),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Arc<str>> {
        if self.lossy {
            Ok(Arc::from(String::from_utf8_lossy(bytes)))
        } else {
            Ok(Arc::from(std::str::from_utf8(bytes)?))
        }
    }
}

impl DataCodec for StringCodec {
    type Value = Arc<str>;

    fn is_match(element: &SchemaElement, options: &FormatOptions) -> bool {
        if element.physical_type != Some(Type::BYTE_ARRAY) {
            return false;
        }
        match element.annotation() {
            Some(ColumnAnnotation::Utf8 | ColumnAnnotation::Enum | ColumnAnnotation::Json) => true,
            None => options.treat_byte_array_as_string,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "String"
    }

    fn pool(&self) -> &ArrayPool<Arc<str>> {
        &self.pool
    }

    fn filler(&self) -> Arc<str> {
        Arc::clone(&self.empty)
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [Arc<str>],
        offset: usize,
    ) -> Result<usize> {
        read_length_prefixed(cursor, dest, offset, |bytes| self.decode(&bytes))
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Arc<str>],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        for value in source_range(source, offset, count)? {
            write_length_prefixed(out, value.as_bytes())?;
        }
        Ok(())
    }

    /// Ordinal byte-wise comparison.
    fn compare(&self, a: &Arc<str>, b: &Arc<str>) -> Ordering {
        a.as_bytes().cmp(b.as_bytes())
    }

    fn plain_decode(
        &self,
        _element: &SchemaElement,
        encoded: Option<&[u8]>,
    ) -> Result<Option<Arc<str>>> {
        encoded.map(|bytes| self.decode(bytes)).transpose()
    }
}

/// Un-annotated or BSON BYTE_ARRAY columns.
#[derive(Debug)]
pub struct ByteArrayCodec {
    pool: ArrayPool<Bytes>,
}

impl ByteArrayCodec {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: pools.bytes.clone(),
        }
    }
}

impl DataCodec for ByteArrayCodec {
    type Value = Bytes;

    fn is_match(element: &SchemaElement, options: &FormatOptions) -> bool {
        if element.physical_type != Some(Type::BYTE_ARRAY) {
            return false;
        }
        match element.annotation() {
            Some(ColumnAnnotation::Bson) => true,
            None => !options.treat_byte_array_as_string,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "ByteArray"
    }

    fn pool(&self) -> &ArrayPool<Bytes> {
        &self.pool
    }

    fn filler(&self) -> Bytes {
        Bytes::new()
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [Bytes],
        offset: usize,
    ) -> Result<usize> {
        read_length_prefixed(cursor, dest, offset, Ok)
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Bytes],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        for value in source_range(source, offset, count)? {
            write_length_prefixed(out, value)?;
        }
        Ok(())
    }

    fn compare(&self, a: &Bytes, b: &Bytes) -> Ordering {
        a.cmp(b)
    }

    fn plain_decode(&self, _element: &SchemaElement, encoded: Option<&[u8]>) -> Result<Option<Bytes>> {
        Ok(encoded.map(Bytes::copy_from_slice))
    }
}

/// FIXED_LEN_BYTE_ARRAY without an annotation, or FLOAT16 kept as raw
/// two-byte values.
#[derive(Debug)]
pub struct FixedLenByteArrayCodec {
    pool: ArrayPool<Bytes>,
}

impl FixedLenByteArrayCodec {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: pools.bytes.clone(),
        }
    }
}

impl DataCodec for FixedLenByteArrayCodec {
    type Value = Bytes;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(Type::FIXED_LEN_BYTE_ARRAY)
            && matches!(element.annotation(), None | Some(ColumnAnnotation::Float16))
    }

    fn name(&self) -> &'static str {
        "FixedLenByteArray"
    }

    fn pool(&self) -> &ArrayPool<Bytes> {
        &self.pool
    }

    fn filler(&self) -> Bytes {
        Bytes::new()
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        element: &SchemaElement,
        dest: &mut [Bytes],
        offset: usize,
    ) -> Result<usize> {
        let width = fixed_length(element)?;
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
            *slot = cursor.read_bytes(width)?;
        }
        Ok(count)
    }

    fn write(
        &self,
        out: &mut BytesMut,
        element: &SchemaElement,
        source: &[Bytes],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let width = fixed_length(element)?;
        let values = source_range(source, offset, count)?;
        out.reserve(values.len() * width);
        for value in values {
            if value.len() != width {
                return Err(ParquetError::invalid_argument(format!(
                    "value of {} bytes in FIXED_LEN_BYTE_ARRAY({}) column '{}'",
                    value.len(),
                    width,
                    element.name
                )));
            }
            out.put_slice(value);
        }
        Ok(())
    }

    fn compare(&self, a: &Bytes, b: &Bytes) -> Ordering {
        a.cmp(b)
    }
}

/// UUIDs stored as FIXED_LEN_BYTE_ARRAY(16).
#[derive(Debug)]
pub struct UuidCodec {
    pool: ArrayPool<Uuid>,
}

impl UuidCodec {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: pools.uuid.clone(),
        }
    }
}

impl DataCodec for UuidCodec {
    type Value = Uuid;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(Type::FIXED_LEN_BYTE_ARRAY)
            && element.annotation() == Some(ColumnAnnotation::Uuid)
    }

    fn name(&self) -> &'static str {
        "Uuid"
    }

    fn pool(&self) -> &ArrayPool<Uuid> {
        &self.pool
    }

    fn filler(&self) -> Uuid {
        Uuid::nil()
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        element: &SchemaElement,
        dest: &mut [Uuid],
        offset: usize,
    ) -> Result<usize> {
        if element.type_length.is_some_and(|len| len != 16) {
            return Err(ParquetError::schema(format!(
                "UUID column '{}' must have type_length 16",
                element.name
            )));
        }
        read_fixed(cursor, dest, offset, |b: [u8; 16]| Ok(Uuid::from_bytes(b)))
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[Uuid],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let values = source_range(source, offset, count)?;
        out.reserve(values.len() * 16);
        for value in values {
            out.put_slice(value.as_bytes());
        }
        Ok(())
    }

    fn compare(&self, a: &Uuid, b: &Uuid) -> Ordering {
        a.as_bytes().cmp(b.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ConvertedType, FieldRepetitionType, LogicalType};

    fn string_element() -> SchemaElement {
        SchemaElement::new_leaf("s", Type::BYTE_ARRAY, FieldRepetitionType::OPTIONAL)
            .with_converted_type(ConvertedType::UTF8)
    }

    #[test]
    fn test_string_wire_format() {
        let codec = StringCodec::new(&PoolSet::default(), &FormatOptions::default());
        let mut out = BytesMut::new();
        let values: Vec<Arc<str>> = vec![Arc::from("ab"), Arc::from("")];
        codec.write(&mut out, &string_element(), &values, 0, 2).unwrap();
        assert_eq!(&out[..], &[2, 0, 0, 0, b'a', b'b', 0, 0, 0, 0]);

        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = vec![codec.filler(); 2];
        assert_eq!(codec.read(&mut cursor, &string_element(), &mut dest, 0).unwrap(), 2);
        assert_eq!(dest, values);
    }

    #[test]
    fn test_declared_length_past_end() {
        let codec = ByteArrayCodec::new(&PoolSet::default());
        let element = SchemaElement::new_leaf("b", Type::BYTE_ARRAY, FieldRepetitionType::REQUIRED);
        let mut cursor = ReadCursor::new(vec![10, 0, 0, 0, 1, 2]);
        let mut dest = vec![Bytes::new(); 1];
        let err = codec.read(&mut cursor, &element, &mut dest, 0).unwrap_err();
        assert!(matches!(err, ParquetError::BufferUnderflow { .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let strict = StringCodec::new(&PoolSet::default(), &FormatOptions::default());
        let lossy = StringCodec::new(
            &PoolSet::default(),
            &FormatOptions::default().with_lossy_utf8(true),
        );
        let bytes = vec![2, 0, 0, 0, 0xFF, b'a'];
        let mut dest = vec![strict.filler(); 1];

        let mut cursor = ReadCursor::new(bytes.clone());
        assert!(matches!(
            strict.read(&mut cursor, &string_element(), &mut dest, 0),
            Err(ParquetError::Utf8(_))
        ));

        let mut cursor = ReadCursor::new(bytes);
        lossy.read(&mut cursor, &string_element(), &mut dest, 0).unwrap();
        assert_eq!(&*dest[0], "\u{FFFD}a");
    }

    #[test]
    fn test_treat_byte_array_as_string() {
        let plain = SchemaElement::new_leaf("b", Type::BYTE_ARRAY, FieldRepetitionType::REQUIRED);
        let default = FormatOptions::default();
        let as_string = FormatOptions::default().with_treat_byte_array_as_string(true);
        assert!(ByteArrayCodec::is_match(&plain, &default));
        assert!(!StringCodec::is_match(&plain, &default));
        assert!(StringCodec::is_match(&plain, &as_string));
        assert!(!ByteArrayCodec::is_match(&plain, &as_string));
    }

    #[test]
    fn test_statistics_have_no_length_prefix() {
        let codec = StringCodec::new(&PoolSet::default(), &FormatOptions::default());
        let value = codec.plain_decode(&string_element(), Some(&b"hello"[..])).unwrap();
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[test]
    fn test_fixed_len_width_checked() {
        let codec = FixedLenByteArrayCodec::new(&PoolSet::default());
        let element = SchemaElement::new_leaf(
            "f",
            Type::FIXED_LEN_BYTE_ARRAY,
            FieldRepetitionType::REQUIRED,
        )
        .with_type_length(3);
        let mut out = BytesMut::new();
        let values = vec![Bytes::from_static(b"abc"), Bytes::from_static(b"xyz")];
        codec.write(&mut out, &element, &values, 0, 2).unwrap();
        assert_eq!(&out[..], b"abcxyz");

        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = vec![Bytes::new(); 2];
        assert_eq!(codec.read(&mut cursor, &element, &mut dest, 0).unwrap(), 2);
        assert_eq!(dest, values);

        let bad = vec![Bytes::from_static(b"ab")];
        assert!(codec.write(&mut BytesMut::new(), &element, &bad, 0, 1).is_err());
    }

    #[test]
    fn test_uuid_roundtrip() {
        let codec = UuidCodec::new(&PoolSet::default());
        let element = SchemaElement::new_leaf(
            "u",
            Type::FIXED_LEN_BYTE_ARRAY,
            FieldRepetitionType::REQUIRED,
        )
        .with_type_length(16)
        .with_logical_type(LogicalType::Uuid);
        let ids = vec![Uuid::from_u128(1), Uuid::from_u128(u128::MAX)];
        let mut out = BytesMut::new();
        codec.write(&mut out, &element, &ids, 0, 2).unwrap();
        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = vec![Uuid::nil(); 2];
        codec.read(&mut cursor, &element, &mut dest, 0).unwrap();
        assert_eq!(dest, ids);
        assert_eq!(codec.compare(&ids[0], &ids[1]), Ordering::Less);
    }
}
