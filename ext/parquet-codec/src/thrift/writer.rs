use bytes::{BufMut, Bytes, BytesMut};

use super::compact_type::CompactType;
use super::varint::{encode_uleb128, zigzag_encode};
use crate::{ParquetError, Result};

/// Compact protocol writer; the exact inverse of [`super::CompactReader`].
///
/// Field headers use the one-byte delta form whenever the id is 1 to 15
/// above the previous id in the same struct.
#[derive(Debug, Default)]
pub struct CompactWriter {
    buf: BytesMut,
    last_field_id: i16,
    saved_ids: Vec<i16>,
}

impl CompactWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        CompactWriter {
            buf: BytesMut::with_capacity(capacity),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn begin_struct(&mut self) {
        self.saved_ids.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub fn end_struct(&mut self) -> Result<()> {
        self.last_field_id = self
            .saved_ids
            .pop()
            .ok_or_else(|| ParquetError::internal("end_struct without matching begin_struct"))?;
        Ok(())
    }

    fn write_header(&mut self, field_type: CompactType, id: i16) -> Result<()> {
        if id < 0 {
            return Err(ParquetError::invalid_argument(format!(
                "negative field id {}",
                id
            )));
        }

        let delta = id as i32 - self.last_field_id as i32;
        if (1..=15).contains(&delta) {
            self.buf.put_u8(((delta as u8) << 4) | field_type.nibble());
        } else {
            self.buf.put_u8(field_type.nibble());
            self.write_i16(id);
        }
        self.last_field_id = id;
        Ok(())
    }

    /// Header for a non-boolean field; the value is written separately.
    pub fn write_field_begin(&mut self, field_type: CompactType, id: i16) -> Result<()> {
        if field_type.is_bool() {
            return Err(ParquetError::invalid_argument(
                "boolean fields must be written with write_bool_field",
            ));
        }
        self.write_header(field_type, id)
    }

    /// Boolean fields are a header only; the tag carries the value.
    pub fn write_bool_field(&mut self, id: i16, value: bool) -> Result<()> {
        self.write_header(CompactType::for_bool(value), id)
    }

    pub fn write_field_stop(&mut self) {
        self.buf.put_u8(0);
    }

    pub fn write_list_begin(&mut self, element_type: CompactType, size: usize) {
        if size < 15 {
            self.buf.put_u8(((size as u8) << 4) | element_type.nibble());
        } else {
            self.buf.put_u8(0xF0 | element_type.nibble());
            encode_uleb128(size as u64, &mut self.buf);
        }
    }

    pub fn write_set_begin(&mut self, element_type: CompactType, size: usize) {
        self.write_list_begin(element_type, size)
    }

    pub fn write_map_begin(&mut self, key_type: CompactType, value_type: CompactType, size: usize) {
        encode_uleb128(size as u64, &mut self.buf);
        if size > 0 {
            self.buf.put_u8((key_type.nibble() << 4) | value_type.nibble());
        }
    }

    /// Boolean list element.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(CompactType::for_bool(value).nibble());
    }

    pub fn write_byte(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        encode_uleb128(zigzag_encode(value as i64), &mut self.buf);
    }

    pub fn write_i32(&mut self, value: i32) {
        encode_uleb128(zigzag_encode(value as i64), &mut self.buf);
    }

    pub fn write_i64(&mut self, value: i64) {
        encode_uleb128(zigzag_encode(value), &mut self.buf);
    }

    pub fn write_double(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    pub fn write_binary(&mut self, value: &[u8]) {
        encode_uleb128(value.len() as u64, &mut self.buf);
        self.buf.put_slice(value);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_binary(value.as_bytes())
    }
}
