use bytes::Bytes;

use super::compact_type::CompactType;
use super::varint::{decode_uleb128, zigzag_decode};
use crate::buffer::ReadCursor;
use crate::{ParquetError, Result};

/// Nested containers deeper than this are rejected instead of recursed into.
pub const MAX_SKIP_DEPTH: usize = 64;

/// Header of a single struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub id: i16,
    pub field_type: CompactType,
}

/// Header of a list or set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    pub element_type: CompactType,
    pub size: usize,
}

/// Header of a map. Empty maps carry no key/value types on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub types: Option<(CompactType, CompactType)>,
    pub size: usize,
}

/// Compact protocol reader over an in-memory buffer.
///
/// Every failure is reported as [`ParquetError::Protocol`] carrying the byte
/// offset and the ids of the fields being decoded at each struct depth.
#[derive(Debug)]
pub struct CompactReader {
    cursor: ReadCursor,
    last_field_id: i16,
    /// Saved `last_field_id` of enclosing structs.
    saved_ids: Vec<i16>,
    /// Field currently being decoded at each struct depth.
    field_path: Vec<i16>,
    /// Value of the last boolean field header, consumed by `read_bool`.
    pending_bool: Option<bool>,
}

impl CompactReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        CompactReader {
            cursor: ReadCursor::new(data),
            last_field_id: 0,
            saved_ids: Vec::new(),
            field_path: Vec::new(),
            pending_bool: None,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Dotted path of field ids, e.g. `4 > 1 > 3`.
    pub fn field_context(&self) -> String {
        self.field_path
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// Protocol error at the current position.
    pub fn error<S: Into<String>>(&self, message: S) -> ParquetError {
        ParquetError::protocol(self.position(), self.field_context(), message)
    }

    fn wrap(&self, err: ParquetError) -> ParquetError {
        match err {
            ParquetError::Protocol { .. } => err,
            ParquetError::BufferUnderflow { needed, remaining, .. } => self.error(format!(
                "truncated stream: needed {} bytes, {} remaining",
                needed, remaining
            )),
            other => self.error(other.to_string()),
        }
    }

    fn byte(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|e| self.wrap(e))
    }

    fn varint(&mut self) -> Result<u64> {
        decode_uleb128(&mut self.cursor).map_err(|e| self.wrap(e))
    }

    fn length(&mut self) -> Result<usize> {
        let len = self.varint()?;
        let len = usize::try_from(len).map_err(|_| self.error("length overflows usize"))?;
        if len > self.remaining() {
            return Err(self.error(format!(
                "declared length {} exceeds {} remaining bytes",
                len,
                self.remaining()
            )));
        }
        Ok(len)
    }

    fn compact_type(&self, nibble: u8) -> Result<CompactType> {
        CompactType::try_from(nibble)
            .map_err(|tag| self.error(format!("unexpected compact type {}", tag)))
    }

    pub fn begin_struct(&mut self) {
        self.saved_ids.push(self.last_field_id);
        self.field_path.push(0);
        self.last_field_id = 0;
    }

    pub fn end_struct(&mut self) -> Result<()> {
        match self.saved_ids.pop() {
            Some(id) => {
                self.last_field_id = id;
                self.field_path.pop();
                Ok(())
            }
            None => Err(self.error("end_struct without matching begin_struct")),
        }
    }

    /// Reads the next field header. `None` is the STOP marker.
    pub fn read_next_field(&mut self) -> Result<Option<FieldHeader>> {
        let header = self.byte()?;
        if header == 0 {
            return Ok(None);
        }

        let field_type = self.compact_type(header & 0x0F)?;
        let delta = (header >> 4) as i16;

        let id = if delta != 0 {
            self.last_field_id
                .checked_add(delta)
                .ok_or_else(|| self.error("field id overflows i16"))?
        } else {
            let id = self.read_i16()?;
            if id < 0 {
                return Err(self.error(format!("negative field id {}", id)));
            }
            id
        };

        self.pending_bool = match field_type {
            CompactType::BooleanTrue => Some(true),
            CompactType::BooleanFalse => Some(false),
            _ => None,
        };
        self.last_field_id = id;
        if let Some(current) = self.field_path.last_mut() {
            *current = id;
        }

        Ok(Some(FieldHeader { id, field_type }))
    }

    /// Boolean field values live in the header; list elements take a byte.
    pub fn read_bool(&mut self) -> Result<bool> {
        if let Some(value) = self.pending_bool.take() {
            return Ok(value);
        }
        match self.byte()? {
            1 => Ok(true),
            0 | 2 => Ok(false),
            other => Err(self.error(format!("invalid boolean byte {}", other))),
        }
    }

    pub fn read_byte(&mut self) -> Result<i8> {
        Ok(self.byte()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let v = zigzag_decode(self.varint()?);
        i16::try_from(v).map_err(|_| self.error(format!("value {} overflows i16", v)))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let v = zigzag_decode(self.varint()?);
        i32::try_from(v).map_err(|_| self.error(format!("value {} overflows i32", v)))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(zigzag_decode(self.varint()?))
    }

    pub fn read_double(&mut self) -> Result<f64> {
        let raw = self.cursor.read_array::<8>().map_err(|e| self.wrap(e))?;
        Ok(f64::from_le_bytes(raw))
    }

    pub fn read_binary(&mut self) -> Result<Bytes> {
        let len = self.length()?;
        self.cursor.read_bytes(len).map_err(|e| self.wrap(e))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let raw = self.read_binary()?;
        match std::str::from_utf8(&raw) {
            Ok(s) => Ok(s.to_string()),
            Err(e) => Err(self.error(format!("invalid UTF-8 in string: {}", e))),
        }
    }

    pub fn read_list_header(&mut self) -> Result<ListHeader> {
        let header = self.byte()?;
        let element_type = self.compact_type(header & 0x0F)?;
        let size = match header >> 4 {
            15 => self.length()?,
            inline => inline as usize,
        };
        // Every element occupies at least one byte.
        if size > self.remaining() {
            return Err(self.error(format!(
                "collection of {} elements exceeds {} remaining bytes",
                size,
                self.remaining()
            )));
        }
        Ok(ListHeader { element_type, size })
    }

    pub fn read_set_header(&mut self) -> Result<ListHeader> {
        self.read_list_header()
    }

    pub fn read_map_header(&mut self) -> Result<MapHeader> {
        let size = self.length()?;
        if size == 0 {
            return Ok(MapHeader { types: None, size });
        }
        let kv = self.byte()?;
        let key = self.compact_type(kv >> 4)?;
        let value = self.compact_type(kv & 0x0F)?;
        Ok(MapHeader {
            types: Some((key, value)),
            size,
        })
    }

    /// Consumes exactly one value of type `field_type`.
    pub fn skip_field(&mut self, field_type: CompactType) -> Result<()> {
        self.skip_nested(field_type, 0)
    }

    fn skip_nested(&mut self, field_type: CompactType, depth: usize) -> Result<()> {
        if depth > MAX_SKIP_DEPTH {
            return Err(self.error("maximum nesting depth exceeded while skipping"));
        }

        match field_type {
            CompactType::BooleanTrue | CompactType::BooleanFalse => {
                self.read_bool()?;
            }
            CompactType::Byte => {
                self.byte()?;
            }
            CompactType::I16 | CompactType::I32 | CompactType::I64 => {
                self.varint()?;
            }
            CompactType::Double => {
                self.cursor.skip(8).map_err(|e| self.wrap(e))?;
            }
            CompactType::Binary => {
                let len = self.length()?;
                self.cursor.skip(len).map_err(|e| self.wrap(e))?;
            }
            CompactType::List | CompactType::Set => {
                let header = self.read_list_header()?;
                for _ in 0..header.size {
                    self.skip_nested(header.element_type, depth + 1)?;
                }
            }
            CompactType::Map => {
                let header = self.read_map_header()?;
                if let Some((key, value)) = header.types {
                    for _ in 0..header.size {
                        self.skip_nested(key, depth + 1)?;
                        self.skip_nested(value, depth + 1)?;
                    }
                }
            }
            CompactType::Struct => {
                self.begin_struct();
                while let Some(field) = self.read_next_field()? {
                    self.skip_nested(field.field_type, depth + 1)?;
                }
                self.end_struct()?;
            }
        }

        Ok(())
    }
}
