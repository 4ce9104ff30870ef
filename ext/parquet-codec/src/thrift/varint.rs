//! Unsigned LEB128 varints and their zig-zag signed variant.
//!
//! 7 payload bits per byte, least significant group first, MSB set on every
//! byte except the last.
use bytes::{BufMut, BytesMut};

use crate::buffer::ReadCursor;
use crate::{ParquetError, Result};

/// Longest encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

pub fn encode_uleb128(mut value: u64, out: &mut BytesMut) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn decode_uleb128(cursor: &mut ReadCursor) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for _ in 0..MAX_VARINT_LEN {
        let byte = cursor.read_u8()?;
        let low_bits = (byte & 0x7F) as u64;
        if shift == 63 && low_bits > 1 {
            return Err(ParquetError::conversion("varint exceeds 64 bits"));
        }
        value |= low_bits << shift;

        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }

    Err(ParquetError::conversion("varint exceeds 64 bits"))
}

pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode(value: u64) -> i64 {
    (value >> 1) as i64 ^ -((value & 1) as i64)
}
