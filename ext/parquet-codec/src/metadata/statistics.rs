use bytes::Bytes;

use crate::thrift::{expect_type, CompactReader, CompactSerialize, CompactType, CompactWriter};
use crate::Result;

/// Column chunk statistics as stored in the footer.
///
/// Values are PLAIN encoded, except that BYTE_ARRAY values carry no length
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Deprecated: signed-order maximum.
    pub max: Option<Bytes>,
    /// Deprecated: signed-order minimum.
    pub min: Option<Bytes>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub max_value: Option<Bytes>,
    pub min_value: Option<Bytes>,
    pub is_max_value_exact: Option<bool>,
    pub is_min_value_exact: Option<bool>,
}

impl Statistics {
    /// True when only the deprecated `min`/`max` fields are populated.
    pub fn is_legacy(&self) -> bool {
        self.min_value.is_none() && self.max_value.is_none()
    }

    /// Encoded `(min, max)`, preferring the current fields.
    pub fn min_max_bytes(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        if self.is_legacy() {
            (self.min.as_deref(), self.max.as_deref())
        } else {
            (self.min_value.as_deref(), self.max_value.as_deref())
        }
    }
}

impl CompactSerialize for Statistics {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut out = Statistics::default();
        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 | 2 | 5 | 6 => {
                    expect_type(reader, &field, CompactType::Binary)?;
                    let value = Some(reader.read_binary()?);
                    match field.id {
                        1 => out.max = value,
                        2 => out.min = value,
                        5 => out.max_value = value,
                        _ => out.min_value = value,
                    }
                }
                3 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    out.null_count = Some(reader.read_i64()?);
                }
                4 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    out.distinct_count = Some(reader.read_i64()?);
                }
                7 => {
                    expect_type(reader, &field, CompactType::BooleanTrue)?;
                    out.is_max_value_exact = Some(reader.read_bool()?);
                }
                8 => {
                    expect_type(reader, &field, CompactType::BooleanTrue)?;
                    out.is_min_value_exact = Some(reader.read_bool()?);
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        if let Some(max) = &self.max {
            writer.write_field_begin(CompactType::Binary, 1)?;
            writer.write_binary(max);
        }
        if let Some(min) = &self.min {
            writer.write_field_begin(CompactType::Binary, 2)?;
            writer.write_binary(min);
        }
        if let Some(n) = self.null_count {
            writer.write_field_begin(CompactType::I64, 3)?;
            writer.write_i64(n);
        }
        if let Some(n) = self.distinct_count {
            writer.write_field_begin(CompactType::I64, 4)?;
            writer.write_i64(n);
        }
        if let Some(max) = &self.max_value {
            writer.write_field_begin(CompactType::Binary, 5)?;
            writer.write_binary(max);
        }
        if let Some(min) = &self.min_value {
            writer.write_field_begin(CompactType::Binary, 6)?;
            writer.write_binary(min);
        }
        if let Some(exact) = self.is_max_value_exact {
            writer.write_bool_field(7, exact)?;
        }
        if let Some(exact) = self.is_min_value_exact {
            writer.write_bool_field(8, exact)?;
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_current_fields() {
        let stats = Statistics {
            max: Some(Bytes::from_static(b"old-max")),
            min: Some(Bytes::from_static(b"old-min")),
            max_value: Some(Bytes::from_static(b"max")),
            min_value: Some(Bytes::from_static(b"min")),
            ..Default::default()
        };
        assert!(!stats.is_legacy());
        assert_eq!(stats.min_max_bytes(), (Some(&b"min"[..]), Some(&b"max"[..])));

        let legacy = Statistics {
            max: Some(Bytes::from_static(b"old-max")),
            ..Default::default()
        };
        assert!(legacy.is_legacy());
        assert_eq!(legacy.min_max_bytes(), (None, Some(&b"old-max"[..])));
    }

    #[test]
    fn test_roundtrip() {
        let stats = Statistics {
            null_count: Some(3),
            distinct_count: Some(10),
            max_value: Some(Bytes::from(vec![9, 0, 0, 0])),
            min_value: Some(Bytes::from(vec![1, 0, 0, 0])),
            is_max_value_exact: Some(true),
            is_min_value_exact: Some(false),
            ..Default::default()
        };
        let mut writer = CompactWriter::new();
        stats.write_to(&mut writer).unwrap();
        let mut reader = CompactReader::new(writer.into_bytes());
        assert_eq!(Statistics::read_from(&mut reader).unwrap(), stats);
    }
}
