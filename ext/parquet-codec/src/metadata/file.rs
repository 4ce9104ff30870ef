use bytes::Bytes;
use indexmap::IndexMap;
use tracing::{debug, warn};

use super::column_chunk::{ColumnChunk, KeyValue};
use super::logical_type::{read_empty_struct, write_empty_struct};
use super::schema_element::SchemaElement;
use crate::thrift::{
    expect_type, read_struct_list, write_struct_list, CompactReader, CompactSerialize, CompactType,
    CompactWriter,
};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortingColumn {
    pub column_idx: i32,
    pub descending: bool,
    pub nulls_first: bool,
}

impl CompactSerialize for SortingColumn {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut column_idx = None;
        let mut descending = None;
        let mut nulls_first = None;
        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    column_idx = Some(reader.read_i32()?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::BooleanTrue)?;
                    descending = Some(reader.read_bool()?);
                }
                3 => {
                    expect_type(reader, &field, CompactType::BooleanTrue)?;
                    nulls_first = Some(reader.read_bool()?);
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }
        let out = SortingColumn {
            column_idx: column_idx.ok_or_else(|| reader.error("SortingColumn missing column_idx"))?,
            descending: descending.ok_or_else(|| reader.error("SortingColumn missing descending"))?,
            nulls_first: nulls_first
                .ok_or_else(|| reader.error("SortingColumn missing nulls_first"))?,
        };
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        writer.write_field_begin(CompactType::I32, 1)?;
        writer.write_i32(self.column_idx);
        writer.write_bool_field(2, self.descending)?;
        writer.write_bool_field(3, self.nulls_first)?;
        writer.write_field_stop();
        writer.end_struct()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub columns: Vec<ColumnChunk>,
    pub total_byte_size: i64,
    pub num_rows: i64,
    pub sorting_columns: Option<Vec<SortingColumn>>,
    pub file_offset: Option<i64>,
    pub total_compressed_size: Option<i64>,
    pub ordinal: Option<i16>,
}

impl CompactSerialize for RowGroup {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut columns = None;
        let mut total_byte_size = None;
        let mut num_rows = None;
        let mut sorting_columns = None;
        let mut file_offset = None;
        let mut total_compressed_size = None;
        let mut ordinal = None;

        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::List)?;
                    columns = Some(read_struct_list(reader)?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    total_byte_size = Some(reader.read_i64()?);
                }
                3 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    num_rows = Some(reader.read_i64()?);
                }
                4 => {
                    expect_type(reader, &field, CompactType::List)?;
                    sorting_columns = Some(read_struct_list(reader)?);
                }
                5 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    file_offset = Some(reader.read_i64()?);
                }
                6 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    total_compressed_size = Some(reader.read_i64()?);
                }
                7 => {
                    expect_type(reader, &field, CompactType::I16)?;
                    ordinal = Some(reader.read_i16()?);
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }

        let out = RowGroup {
            columns: columns.ok_or_else(|| reader.error("RowGroup missing required field columns"))?,
            total_byte_size: total_byte_size
                .ok_or_else(|| reader.error("RowGroup missing required field total_byte_size"))?,
            num_rows: num_rows.ok_or_else(|| reader.error("RowGroup missing required field num_rows"))?,
            sorting_columns,
            file_offset,
            total_compressed_size,
            ordinal,
        };
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        write_struct_list(writer, 1, &self.columns)?;
        writer.write_field_begin(CompactType::I64, 2)?;
        writer.write_i64(self.total_byte_size);
        writer.write_field_begin(CompactType::I64, 3)?;
        writer.write_i64(self.num_rows);
        if let Some(sorting) = &self.sorting_columns {
            write_struct_list(writer, 4, sorting)?;
        }
        if let Some(offset) = self.file_offset {
            writer.write_field_begin(CompactType::I64, 5)?;
            writer.write_i64(offset);
        }
        if let Some(size) = self.total_compressed_size {
            writer.write_field_begin(CompactType::I64, 6)?;
            writer.write_i64(size);
        }
        if let Some(ordinal) = self.ordinal {
            writer.write_field_begin(CompactType::I16, 7)?;
            writer.write_i16(ordinal);
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}

/// Sort order used for a column's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrder {
    TypeDefinedOrder,
    /// A union member this crate does not know.
    Undefined,
}

impl CompactSerialize for ColumnOrder {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut out = ColumnOrder::Undefined;
        while let Some(field) = reader.read_next_field()? {
            match (field.id, field.field_type) {
                (1, CompactType::Struct) => {
                    read_empty_struct(reader)?;
                    out = ColumnOrder::TypeDefinedOrder;
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        if let ColumnOrder::TypeDefinedOrder = self {
            writer.write_field_begin(CompactType::Struct, 1)?;
            write_empty_struct(writer)?;
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}

/// Decoded file footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetaData {
    pub version: i32,
    /// Flattened depth-first schema; element 0 is the root.
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroup>,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub created_by: Option<String>,
    pub column_orders: Option<Vec<ColumnOrder>>,
}

impl FileMetaData {
    /// Decodes a footer payload (without the length/magic trailer).
    pub fn try_decode(data: Bytes) -> Result<Self> {
        let len = data.len();
        let mut reader = CompactReader::new(data);
        let metadata = FileMetaData::read_from(&mut reader)?;
        debug!(
            bytes = len,
            row_groups = metadata.row_groups.len(),
            schema_elements = metadata.schema.len(),
            "decoded file metadata"
        );
        Ok(metadata)
    }

    pub fn encode(&self) -> Result<Bytes> {
        let mut writer = CompactWriter::with_capacity(1024);
        self.write_to(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Key/value metadata in file order; later duplicates win.
    pub fn key_value_map(&self) -> IndexMap<String, Option<String>> {
        let mut map = IndexMap::new();
        for kv in self.key_value_metadata.iter().flatten() {
            if map.insert(kv.key.clone(), kv.value.clone()).is_some() {
                warn!(key = %kv.key, "duplicate key in file metadata, keeping last value");
            }
        }
        map
    }
}

impl CompactSerialize for FileMetaData {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut version = None;
        let mut schema = None;
        let mut num_rows = None;
        let mut row_groups = None;
        let mut key_value_metadata = None;
        let mut created_by = None;
        let mut column_orders = None;

        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    version = Some(reader.read_i32()?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::List)?;
                    schema = Some(read_struct_list(reader)?);
                }
                3 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    num_rows = Some(reader.read_i64()?);
                }
                4 => {
                    expect_type(reader, &field, CompactType::List)?;
                    row_groups = Some(read_struct_list(reader)?);
                }
                5 => {
                    expect_type(reader, &field, CompactType::List)?;
                    key_value_metadata = Some(read_struct_list(reader)?);
                }
                6 => {
                    expect_type(reader, &field, CompactType::Binary)?;
                    created_by = Some(reader.read_string()?);
                }
                7 => {
                    expect_type(reader, &field, CompactType::List)?;
                    column_orders = Some(read_struct_list(reader)?);
                }
                // 8 and 9 carry encryption parameters, which are not supported.
                _ => reader.skip_field(field.field_type)?,
            }
        }

        let missing = |name: &str| reader.error(format!("FileMetaData missing required field {}", name));
        let out = FileMetaData {
            version: version.ok_or_else(|| missing("version"))?,
            schema: schema.ok_or_else(|| missing("schema"))?,
            num_rows: num_rows.ok_or_else(|| missing("num_rows"))?,
            row_groups: row_groups.ok_or_else(|| missing("row_groups"))?,
            key_value_metadata,
            created_by,
            column_orders,
        };
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        writer.write_field_begin(CompactType::I32, 1)?;
        writer.write_i32(self.version);
        write_struct_list(writer, 2, &self.schema)?;
        writer.write_field_begin(CompactType::I64, 3)?;
        writer.write_i64(self.num_rows);
        write_struct_list(writer, 4, &self.row_groups)?;
        if let Some(kv) = &self.key_value_metadata {
            write_struct_list(writer, 5, kv)?;
        }
        if let Some(created_by) = &self.created_by {
            writer.write_field_begin(CompactType::Binary, 6)?;
            writer.write_string(created_by);
        }
        if let Some(orders) = &self.column_orders {
            write_struct_list(writer, 7, orders)?;
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}
