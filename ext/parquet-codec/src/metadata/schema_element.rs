use super::enums::{ConvertedType, FieldRepetitionType, Type};
use super::logical_type::{LogicalType, TimeUnit};
use crate::thrift::{expect_type, CompactReader, CompactSerialize, CompactType, CompactWriter};
use crate::Result;

/// One node of the flattened, depth-first schema stored in the footer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaElement {
    /// Physical type; `None` for group nodes.
    pub physical_type: Option<Type>,
    /// Byte width of FIXED_LEN_BYTE_ARRAY values.
    pub type_length: Option<i32>,
    pub repetition_type: Option<FieldRepetitionType>,
    pub name: String,
    pub num_children: Option<i32>,
    pub converted_type: Option<ConvertedType>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub field_id: Option<i32>,
    pub logical_type: Option<LogicalType>,
}

/// Annotation of a leaf after reconciling the logical and converted types.
///
/// The logical type wins when both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnAnnotation {
    Utf8,
    Enum,
    Json,
    Bson,
    Decimal { precision: i32, scale: i32 },
    Date,
    Time(TimeUnit),
    Timestamp(TimeUnit),
    Integer { bit_width: u8, signed: bool },
    Uuid,
    Interval,
    Float16,
    Map,
    MapKeyValue,
    List,
    Unknown,
}

impl SchemaElement {
    /// A leaf with the given physical type.
    pub fn new_leaf<S: Into<String>>(
        name: S,
        physical_type: Type,
        repetition: FieldRepetitionType,
    ) -> Self {
        SchemaElement {
            name: name.into(),
            physical_type: Some(physical_type),
            repetition_type: Some(repetition),
            ..Default::default()
        }
    }

    /// A group node with `num_children` children following it.
    pub fn new_group<S: Into<String>>(
        name: S,
        repetition: Option<FieldRepetitionType>,
        num_children: i32,
    ) -> Self {
        SchemaElement {
            name: name.into(),
            repetition_type: repetition,
            num_children: Some(num_children),
            ..Default::default()
        }
    }

    pub fn with_converted_type(mut self, converted: ConvertedType) -> Self {
        self.converted_type = Some(converted);
        self
    }

    pub fn with_logical_type(mut self, logical: LogicalType) -> Self {
        self.logical_type = Some(logical);
        self
    }

    pub fn with_type_length(mut self, length: i32) -> Self {
        self.type_length = Some(length);
        self
    }

    pub fn with_decimal(mut self, precision: i32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn is_group(&self) -> bool {
        self.physical_type.is_none()
    }

    pub fn repetition(&self) -> FieldRepetitionType {
        self.repetition_type
            .unwrap_or(FieldRepetitionType::REQUIRED)
    }

    pub fn annotation(&self) -> Option<ColumnAnnotation> {
        if let Some(logical) = &self.logical_type {
            return Some(match *logical {
                LogicalType::String => ColumnAnnotation::Utf8,
                LogicalType::Map => ColumnAnnotation::Map,
                LogicalType::List => ColumnAnnotation::List,
                LogicalType::Enum => ColumnAnnotation::Enum,
                LogicalType::Decimal { scale, precision } => {
                    ColumnAnnotation::Decimal { precision, scale }
                }
                LogicalType::Date => ColumnAnnotation::Date,
                LogicalType::Time { unit, .. } => ColumnAnnotation::Time(unit),
                LogicalType::Timestamp { unit, .. } => ColumnAnnotation::Timestamp(unit),
                LogicalType::Integer {
                    bit_width,
                    is_signed,
                } => ColumnAnnotation::Integer {
                    bit_width: bit_width as u8,
                    signed: is_signed,
                },
                LogicalType::Unknown => ColumnAnnotation::Unknown,
                LogicalType::Json => ColumnAnnotation::Json,
                LogicalType::Bson => ColumnAnnotation::Bson,
                LogicalType::Uuid => ColumnAnnotation::Uuid,
                LogicalType::Float16 => ColumnAnnotation::Float16,
            });
        }

        let int = |bit_width: u8, signed: bool| ColumnAnnotation::Integer { bit_width, signed };
        self.converted_type.map(|converted| match converted {
            ConvertedType::UTF8 => ColumnAnnotation::Utf8,
            ConvertedType::MAP => ColumnAnnotation::Map,
            ConvertedType::MAP_KEY_VALUE => ColumnAnnotation::MapKeyValue,
            ConvertedType::LIST => ColumnAnnotation::List,
            ConvertedType::ENUM => ColumnAnnotation::Enum,
            ConvertedType::DECIMAL => ColumnAnnotation::Decimal {
                precision: self.precision.unwrap_or(0),
                scale: self.scale.unwrap_or(0),
            },
            ConvertedType::DATE => ColumnAnnotation::Date,
            ConvertedType::TIME_MILLIS => ColumnAnnotation::Time(TimeUnit::Millis),
            ConvertedType::TIME_MICROS => ColumnAnnotation::Time(TimeUnit::Micros),
            ConvertedType::TIMESTAMP_MILLIS => ColumnAnnotation::Timestamp(TimeUnit::Millis),
            ConvertedType::TIMESTAMP_MICROS => ColumnAnnotation::Timestamp(TimeUnit::Micros),
            ConvertedType::UINT_8 => int(8, false),
            ConvertedType::UINT_16 => int(16, false),
            ConvertedType::UINT_32 => int(32, false),
            ConvertedType::UINT_64 => int(64, false),
            ConvertedType::INT_8 => int(8, true),
            ConvertedType::INT_16 => int(16, true),
            ConvertedType::INT_32 => int(32, true),
            ConvertedType::INT_64 => int(64, true),
            ConvertedType::JSON => ColumnAnnotation::Json,
            ConvertedType::BSON => ColumnAnnotation::Bson,
            ConvertedType::INTERVAL => ColumnAnnotation::Interval,
        })
    }
}

impl CompactSerialize for SchemaElement {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut out = SchemaElement::default();
        let mut name = None;

        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.physical_type = Some(Type::read(reader, &field)?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.type_length = Some(reader.read_i32()?);
                }
                3 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.repetition_type = Some(FieldRepetitionType::read(reader, &field)?);
                }
                4 => {
                    expect_type(reader, &field, CompactType::Binary)?;
                    name = Some(reader.read_string()?);
                }
                5 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.num_children = Some(reader.read_i32()?);
                }
                6 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.converted_type = Some(ConvertedType::read(reader, &field)?);
                }
                7 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.scale = Some(reader.read_i32()?);
                }
                8 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.precision = Some(reader.read_i32()?);
                }
                9 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    out.field_id = Some(reader.read_i32()?);
                }
                10 => {
                    expect_type(reader, &field, CompactType::Struct)?;
                    out.logical_type = LogicalType::read_union(reader)?;
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }

        out.name = name.ok_or_else(|| reader.error("SchemaElement missing required field name"))?;
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        if let Some(t) = self.physical_type {
            writer.write_field_begin(CompactType::I32, 1)?;
            writer.write_i32(t.to_thrift());
        }
        if let Some(len) = self.type_length {
            writer.write_field_begin(CompactType::I32, 2)?;
            writer.write_i32(len);
        }
        if let Some(rep) = self.repetition_type {
            writer.write_field_begin(CompactType::I32, 3)?;
            writer.write_i32(rep.to_thrift());
        }
        writer.write_field_begin(CompactType::Binary, 4)?;
        writer.write_string(&self.name);
        if let Some(n) = self.num_children {
            writer.write_field_begin(CompactType::I32, 5)?;
            writer.write_i32(n);
        }
        if let Some(c) = self.converted_type {
            writer.write_field_begin(CompactType::I32, 6)?;
            writer.write_i32(c.to_thrift());
        }
        if let Some(scale) = self.scale {
            writer.write_field_begin(CompactType::I32, 7)?;
            writer.write_i32(scale);
        }
        if let Some(precision) = self.precision {
            writer.write_field_begin(CompactType::I32, 8)?;
            writer.write_i32(precision);
        }
        if let Some(id) = self.field_id {
            writer.write_field_begin(CompactType::I32, 9)?;
            writer.write_i32(id);
        }
        if let Some(logical) = &self.logical_type {
            writer.write_field_begin(CompactType::Struct, 10)?;
            logical.write_union(writer)?;
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}
