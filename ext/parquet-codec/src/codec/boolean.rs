use bytes::{BufMut, BytesMut};
use std::cmp::Ordering;

use super::{capacity, source_range, ArrayPool, DataCodec, PoolSet};
use crate::buffer::ReadCursor;
use crate::metadata::{SchemaElement, Type};
use crate::options::FormatOptions;
use crate::Result;

/// Bit-packed booleans, least significant bit first.
///
/// The input carries no value count, so `read` decodes every bit of every
/// byte it consumes up to the destination's capacity. Size `dest` to the
/// page's value count to skip the padding bits of the last byte.
#[derive(Debug)]
pub struct BooleanCodec {
    pool: ArrayPool<bool>,
}

impl BooleanCodec {
    pub fn new(pools: &PoolSet) -> Self {
        Self {
            pool: pools.boolean.clone(),
        }
    }
}

impl DataCodec for BooleanCodec {
    type Value = bool;

    fn is_match(element: &SchemaElement, _options: &FormatOptions) -> bool {
        element.physical_type == Some(Type::BOOLEAN)
    }

    fn name(&self) -> &'static str {
        "Boolean"
    }

    fn pool(&self) -> &ArrayPool<bool> {
        &self.pool
    }

    fn filler(&self) -> bool {
        false
    }

    fn read(
        &self,
        cursor: &mut ReadCursor,
        _element: &SchemaElement,
        dest: &mut [bool],
        offset: usize,
    ) -> Result<usize> {
        let capacity = capacity(dest, offset)?;
        if cursor.is_empty() || capacity == 0 {
            return Ok(0);
        }
        let count = capacity.min(cursor.remaining().saturating_mul(8));
        let bytes = cursor.read_slice(count.div_ceil(8))?;
        for (i, slot) in dest[offset..offset + count].iter_mut().enumerate() {
            *slot = (bytes[i / 8] >> (i % 8)) & 1 == 1;
        }
        Ok(count)
    }

    fn write(
        &self,
        out: &mut BytesMut,
        _element: &SchemaElement,
        source: &[bool],
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let values = source_range(source, offset, count)?;
        out.reserve(values.len().div_ceil(8));
        for chunk in values.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (bit, v)| acc | (u8::from(*v) << bit));
            out.put_u8(byte);
        }
        Ok(())
    }

    fn compare(&self, a: &bool, b: &bool) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FieldRepetitionType;

    fn element() -> SchemaElement {
        SchemaElement::new_leaf("flag", Type::BOOLEAN, FieldRepetitionType::REQUIRED)
    }

    #[test]
    fn test_bit_layout() {
        let codec = BooleanCodec::new(&PoolSet::default());
        let mut out = BytesMut::new();
        let values = [true, false, true, true, false, false, false, false, true];
        codec.write(&mut out, &element(), &values, 0, values.len()).unwrap();
        assert_eq!(&out[..], &[0b0000_1101, 0b0000_0001]);

        let mut cursor = ReadCursor::new(out.freeze());
        let mut dest = [false; 9];
        assert_eq!(codec.read(&mut cursor, &element(), &mut dest, 0).unwrap(), 9);
        assert_eq!(dest, values);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_bounded_by_input() {
        let codec = BooleanCodec::new(&PoolSet::default());
        let mut cursor = ReadCursor::new(vec![0xFF]);
        let mut dest = [false; 20];
        assert_eq!(codec.read(&mut cursor, &element(), &mut dest, 0).unwrap(), 8);
        assert!(dest[..8].iter().all(|v| *v));
    }

    #[test]
    fn test_statistics_value() {
        let codec = BooleanCodec::new(&PoolSet::default());
        assert_eq!(codec.plain_decode(&element(), Some(&[1u8][..])).unwrap(), Some(true));
        assert_eq!(codec.plain_decode(&element(), Some(&[0u8][..])).unwrap(), Some(false));
        assert_eq!(codec.plain_decode(&element(), None).unwrap(), None);
    }

    #[test]
    fn test_order() {
        let codec = BooleanCodec::new(&PoolSet::default());
        assert_eq!(codec.compare(&false, &true), Ordering::Less);
    }
}
