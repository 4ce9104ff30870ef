//! The `LogicalType` union and its member structs.

use crate::thrift::{expect_type, CompactReader, CompactType, CompactWriter};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

impl TimeUnit {
    fn field_id(self) -> i16 {
        match self {
            TimeUnit::Millis => 1,
            TimeUnit::Micros => 2,
            TimeUnit::Nanos => 3,
        }
    }

    /// Number of units in one second.
    pub fn per_second(self) -> i64 {
        match self {
            TimeUnit::Millis => 1_000,
            TimeUnit::Micros => 1_000_000,
            TimeUnit::Nanos => 1_000_000_000,
        }
    }

    fn read(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut unit = None;
        while let Some(field) = reader.read_next_field()? {
            let parsed = match field.id {
                1 => Some(TimeUnit::Millis),
                2 => Some(TimeUnit::Micros),
                3 => Some(TimeUnit::Nanos),
                _ => None,
            };
            expect_type(reader, &field, CompactType::Struct)?;
            read_empty_struct(reader)?;
            if parsed.is_some() {
                unit = parsed;
            }
        }
        reader.end_struct()?;
        unit.ok_or_else(|| reader.error("TimeUnit union has no recognised member"))
    }

    fn write(self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        writer.write_field_begin(CompactType::Struct, self.field_id())?;
        write_empty_struct(writer)?;
        writer.write_field_stop();
        writer.end_struct()
    }
}

/// Modern logical type annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { scale: i32, precision: i32 },
    Date,
    Time { is_adjusted_to_utc: bool, unit: TimeUnit },
    Timestamp { is_adjusted_to_utc: bool, unit: TimeUnit },
    Integer { bit_width: i8, is_signed: bool },
    Unknown,
    Json,
    Bson,
    Uuid,
    Float16,
}

/// Consumes a struct whose fields are all ignored.
pub(crate) fn read_empty_struct(reader: &mut CompactReader) -> Result<()> {
    reader.begin_struct();
    while let Some(field) = reader.read_next_field()? {
        reader.skip_field(field.field_type)?;
    }
    reader.end_struct()
}

pub(crate) fn write_empty_struct(writer: &mut CompactWriter) -> Result<()> {
    writer.begin_struct();
    writer.write_field_stop();
    writer.end_struct()
}

impl LogicalType {
    fn field_id(&self) -> i16 {
        match self {
            LogicalType::String => 1,
            LogicalType::Map => 2,
            LogicalType::List => 3,
            LogicalType::Enum => 4,
            LogicalType::Decimal { .. } => 5,
            LogicalType::Date => 6,
            LogicalType::Time { .. } => 7,
            LogicalType::Timestamp { .. } => 8,
            LogicalType::Integer { .. } => 10,
            LogicalType::Unknown => 11,
            LogicalType::Json => 12,
            LogicalType::Bson => 13,
            LogicalType::Uuid => 14,
            LogicalType::Float16 => 15,
        }
    }

    /// Reads the union. Members this crate doesn't know are skipped and
    /// yield `None`, so newer writers don't break older readers.
    pub fn read_union(reader: &mut CompactReader) -> Result<Option<Self>> {
        reader.begin_struct();
        let mut out = None;
        while let Some(field) = reader.read_next_field()? {
            if field.field_type != CompactType::Struct {
                reader.skip_field(field.field_type)?;
                continue;
            }
            let parsed = match field.id {
                1 => Some(LogicalType::String),
                2 => Some(LogicalType::Map),
                3 => Some(LogicalType::List),
                4 => Some(LogicalType::Enum),
                5 => Some(read_decimal(reader)?),
                6 => Some(LogicalType::Date),
                7 => {
                    let (is_adjusted_to_utc, unit) = read_temporal(reader)?;
                    Some(LogicalType::Time {
                        is_adjusted_to_utc,
                        unit,
                    })
                }
                8 => {
                    let (is_adjusted_to_utc, unit) = read_temporal(reader)?;
                    Some(LogicalType::Timestamp {
                        is_adjusted_to_utc,
                        unit,
                    })
                }
                10 => Some(read_integer(reader)?),
                11 => Some(LogicalType::Unknown),
                12 => Some(LogicalType::Json),
                13 => Some(LogicalType::Bson),
                14 => Some(LogicalType::Uuid),
                15 => Some(LogicalType::Float16),
                _ => None,
            };
            match parsed {
                // Members with a payload consumed their struct above.
                Some(
                    LogicalType::Decimal { .. }
                    | LogicalType::Time { .. }
                    | LogicalType::Timestamp { .. }
                    | LogicalType::Integer { .. },
                ) => {}
                _ => read_empty_struct(reader)?,
            }
            if parsed.is_some() {
                out = parsed;
            }
        }
        reader.end_struct()?;
        Ok(out)
    }

    pub fn write_union(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        writer.write_field_begin(CompactType::Struct, self.field_id())?;
        writer.begin_struct();
        match *self {
            LogicalType::Decimal { scale, precision } => {
                writer.write_field_begin(CompactType::I32, 1)?;
                writer.write_i32(scale);
                writer.write_field_begin(CompactType::I32, 2)?;
                writer.write_i32(precision);
            }
            LogicalType::Time {
                is_adjusted_to_utc,
                unit,
            }
            | LogicalType::Timestamp {
                is_adjusted_to_utc,
                unit,
            } => {
                writer.write_bool_field(1, is_adjusted_to_utc)?;
                writer.write_field_begin(CompactType::Struct, 2)?;
                unit.write(writer)?;
            }
            LogicalType::Integer {
                bit_width,
                is_signed,
            } => {
                writer.write_field_begin(CompactType::Byte, 1)?;
                writer.write_byte(bit_width);
                writer.write_bool_field(2, is_signed)?;
            }
            _ => {}
        }
        writer.write_field_stop();
        writer.end_struct()?;
        writer.write_field_stop();
        writer.end_struct()
    }
}

fn read_decimal(reader: &mut CompactReader) -> Result<LogicalType> {
    reader.begin_struct();
    let mut scale = None;
    let mut precision = None;
    while let Some(field) = reader.read_next_field()? {
        match field.id {
            1 => {
                expect_type(reader, &field, CompactType::I32)?;
                scale = Some(reader.read_i32()?);
            }
            2 => {
                expect_type(reader, &field, CompactType::I32)?;
                precision = Some(reader.read_i32()?);
            }
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.end_struct()?;
    Ok(LogicalType::Decimal {
        scale: scale.ok_or_else(|| reader.error("DecimalType missing scale"))?,
        precision: precision.ok_or_else(|| reader.error("DecimalType missing precision"))?,
    })
}

fn read_temporal(reader: &mut CompactReader) -> Result<(bool, TimeUnit)> {
    reader.begin_struct();
    let mut adjusted = None;
    let mut unit = None;
    while let Some(field) = reader.read_next_field()? {
        match field.id {
            1 => {
                expect_type(reader, &field, CompactType::BooleanTrue)?;
                adjusted = Some(reader.read_bool()?);
            }
            2 => {
                expect_type(reader, &field, CompactType::Struct)?;
                unit = Some(TimeUnit::read(reader)?);
            }
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.end_struct()?;
    Ok((
        adjusted.ok_or_else(|| reader.error("time type missing isAdjustedToUTC"))?,
        unit.ok_or_else(|| reader.error("time type missing unit"))?,
    ))
}

fn read_integer(reader: &mut CompactReader) -> Result<LogicalType> {
    reader.begin_struct();
    let mut bit_width = None;
    let mut is_signed = None;
    while let Some(field) = reader.read_next_field()? {
        match field.id {
            1 => {
                expect_type(reader, &field, CompactType::Byte)?;
                bit_width = Some(reader.read_byte()?);
            }
            2 => {
                expect_type(reader, &field, CompactType::BooleanTrue)?;
                is_signed = Some(reader.read_bool()?);
            }
            _ => reader.skip_field(field.field_type)?,
        }
    }
    reader.end_struct()?;
    Ok(LogicalType::Integer {
        bit_width: bit_width.ok_or_else(|| reader.error("IntType missing bitWidth"))?,
        is_signed: is_signed.ok_or_else(|| reader.error("IntType missing isSigned"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(logical: LogicalType) -> Option<LogicalType> {
        let mut writer = CompactWriter::new();
        logical.write_union(&mut writer).unwrap();
        let mut reader = CompactReader::new(writer.into_bytes());
        let out = LogicalType::read_union(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
        out
    }

    #[test]
    fn test_union_members_roundtrip() {
        let all = [
            LogicalType::String,
            LogicalType::Map,
            LogicalType::List,
            LogicalType::Enum,
            LogicalType::Decimal {
                scale: 2,
                precision: 10,
            },
            LogicalType::Date,
            LogicalType::Time {
                is_adjusted_to_utc: false,
                unit: TimeUnit::Millis,
            },
            LogicalType::Timestamp {
                is_adjusted_to_utc: true,
                unit: TimeUnit::Nanos,
            },
            LogicalType::Integer {
                bit_width: 16,
                is_signed: false,
            },
            LogicalType::Unknown,
            LogicalType::Json,
            LogicalType::Bson,
            LogicalType::Uuid,
            LogicalType::Float16,
        ];
        for logical in all {
            assert_eq!(roundtrip(logical), Some(logical));
        }
    }

    #[test]
    fn test_unrecognised_member_is_skipped() {
        // union { 9: struct { 1: i32 = 1 } } -- id 9 is unassigned.
        let bytes = vec![0x9C, 0x15, 0x02, 0x00, 0x00];
        let mut reader = CompactReader::new(bytes);
        assert_eq!(LogicalType::read_union(&mut reader).unwrap(), None);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_decimal_wire_bytes() {
        let mut writer = CompactWriter::new();
        LogicalType::Decimal {
            scale: 2,
            precision: 9,
        }
        .write_union(&mut writer)
        .unwrap();
        assert_eq!(
            writer.as_slice(),
            &[0x5C, 0x15, 0x04, 0x15, 0x12, 0x00, 0x00]
        );
    }
}
