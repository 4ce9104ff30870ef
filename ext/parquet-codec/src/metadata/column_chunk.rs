use super::enums::{CompressionCodec, Encoding, PageType, Type};
use super::statistics::Statistics;
use crate::thrift::{
    expect_type, read_struct_list, write_struct_list, CompactReader, CompactSerialize, CompactType,
    CompactWriter,
};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl KeyValue {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        KeyValue {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

impl CompactSerialize for KeyValue {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut key = None;
        let mut value = None;
        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::Binary)?;
                    key = Some(reader.read_string()?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::Binary)?;
                    value = Some(reader.read_string()?);
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }
        let key = key.ok_or_else(|| reader.error("KeyValue missing required field key"))?;
        reader.end_struct()?;
        Ok(KeyValue { key, value })
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        writer.write_field_begin(CompactType::Binary, 1)?;
        writer.write_string(&self.key);
        if let Some(value) = &self.value {
            writer.write_field_begin(CompactType::Binary, 2)?;
            writer.write_string(value);
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEncodingStats {
    pub page_type: PageType,
    pub encoding: Encoding,
    pub count: i32,
}

impl CompactSerialize for PageEncodingStats {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut page_type = None;
        let mut encoding = None;
        let mut count = None;
        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    page_type = Some(PageType::read(reader, &field)?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    encoding = Some(Encoding::read(reader, &field)?);
                }
                3 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    count = Some(reader.read_i32()?);
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }
        let out = PageEncodingStats {
            page_type: page_type.ok_or_else(|| reader.error("PageEncodingStats missing page_type"))?,
            encoding: encoding.ok_or_else(|| reader.error("PageEncodingStats missing encoding"))?,
            count: count.ok_or_else(|| reader.error("PageEncodingStats missing count"))?,
        };
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        writer.write_field_begin(CompactType::I32, 1)?;
        writer.write_i32(self.page_type.to_thrift());
        writer.write_field_begin(CompactType::I32, 2)?;
        writer.write_i32(self.encoding.to_thrift());
        writer.write_field_begin(CompactType::I32, 3)?;
        writer.write_i32(self.count);
        writer.write_field_stop();
        writer.end_struct()
    }
}

/// Per-chunk column metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetaData {
    pub physical_type: Type,
    pub encodings: Vec<Encoding>,
    pub path_in_schema: Vec<String>,
    pub codec: CompressionCodec,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub key_value_metadata: Option<Vec<KeyValue>>,
    pub data_page_offset: i64,
    pub index_page_offset: Option<i64>,
    pub dictionary_page_offset: Option<i64>,
    pub statistics: Option<Statistics>,
    pub encoding_stats: Option<Vec<PageEncodingStats>>,
    pub bloom_filter_offset: Option<i64>,
    pub bloom_filter_length: Option<i32>,
}

impl ColumnMetaData {
    /// Dotted column path, e.g. `a.b.c`.
    pub fn path(&self) -> String {
        self.path_in_schema.join(".")
    }
}

fn read_i32_list(reader: &mut CompactReader) -> Result<Vec<i32>> {
    let header = reader.read_list_header()?;
    if header.element_type != CompactType::I32 {
        return Err(reader.error(format!(
            "expected list<i32>, got list<{}>",
            header.element_type
        )));
    }
    (0..header.size).map(|_| reader.read_i32()).collect()
}

fn read_string_list(reader: &mut CompactReader) -> Result<Vec<String>> {
    let header = reader.read_list_header()?;
    if header.element_type != CompactType::Binary {
        return Err(reader.error(format!(
            "expected list<binary>, got list<{}>",
            header.element_type
        )));
    }
    (0..header.size).map(|_| reader.read_string()).collect()
}

impl CompactSerialize for ColumnMetaData {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut physical_type = None;
        let mut encodings = None;
        let mut path_in_schema = None;
        let mut codec = None;
        let mut num_values = None;
        let mut total_uncompressed_size = None;
        let mut total_compressed_size = None;
        let mut key_value_metadata = None;
        let mut data_page_offset = None;
        let mut index_page_offset = None;
        let mut dictionary_page_offset = None;
        let mut statistics = None;
        let mut encoding_stats = None;
        let mut bloom_filter_offset = None;
        let mut bloom_filter_length = None;

        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    physical_type = Some(Type::read(reader, &field)?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::List)?;
                    let raw = read_i32_list(reader)?;
                    let mut parsed = Vec::with_capacity(raw.len());
                    for value in raw {
                        parsed.push(Encoding::from_thrift(value).ok_or_else(|| {
                            reader.error(format!("invalid Encoding value {}", value))
                        })?);
                    }
                    encodings = Some(parsed);
                }
                3 => {
                    expect_type(reader, &field, CompactType::List)?;
                    path_in_schema = Some(read_string_list(reader)?);
                }
                4 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    codec = Some(CompressionCodec::read(reader, &field)?);
                }
                5 | 6 | 7 | 9 | 10 | 11 | 14 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    let value = Some(reader.read_i64()?);
                    match field.id {
                        5 => num_values = value,
                        6 => total_uncompressed_size = value,
                        7 => total_compressed_size = value,
                        9 => data_page_offset = value,
                        10 => index_page_offset = value,
                        11 => dictionary_page_offset = value,
                        _ => bloom_filter_offset = value,
                    }
                }
                8 => {
                    expect_type(reader, &field, CompactType::List)?;
                    key_value_metadata = Some(read_struct_list(reader)?);
                }
                12 => {
                    expect_type(reader, &field, CompactType::Struct)?;
                    statistics = Some(Statistics::read_from(reader)?);
                }
                13 => {
                    expect_type(reader, &field, CompactType::List)?;
                    encoding_stats = Some(read_struct_list(reader)?);
                }
                15 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    bloom_filter_length = Some(reader.read_i32()?);
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }

        let missing = |name: &str| reader.error(format!("ColumnMetaData missing required field {}", name));
        let out = ColumnMetaData {
            physical_type: physical_type.ok_or_else(|| missing("type"))?,
            encodings: encodings.ok_or_else(|| missing("encodings"))?,
            path_in_schema: path_in_schema.ok_or_else(|| missing("path_in_schema"))?,
            codec: codec.ok_or_else(|| missing("codec"))?,
            num_values: num_values.ok_or_else(|| missing("num_values"))?,
            total_uncompressed_size: total_uncompressed_size
                .ok_or_else(|| missing("total_uncompressed_size"))?,
            total_compressed_size: total_compressed_size
                .ok_or_else(|| missing("total_compressed_size"))?,
            key_value_metadata,
            data_page_offset: data_page_offset.ok_or_else(|| missing("data_page_offset"))?,
            index_page_offset,
            dictionary_page_offset,
            statistics,
            encoding_stats,
            bloom_filter_offset,
            bloom_filter_length,
        };
        reader.end_struct()?;
        Ok(out)
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        writer.write_field_begin(CompactType::I32, 1)?;
        writer.write_i32(self.physical_type.to_thrift());

        writer.write_field_begin(CompactType::List, 2)?;
        writer.write_list_begin(CompactType::I32, self.encodings.len());
        for encoding in &self.encodings {
            writer.write_i32(encoding.to_thrift());
        }

        writer.write_field_begin(CompactType::List, 3)?;
        writer.write_list_begin(CompactType::Binary, self.path_in_schema.len());
        for part in &self.path_in_schema {
            writer.write_string(part);
        }

        writer.write_field_begin(CompactType::I32, 4)?;
        writer.write_i32(self.codec.to_thrift());
        writer.write_field_begin(CompactType::I64, 5)?;
        writer.write_i64(self.num_values);
        writer.write_field_begin(CompactType::I64, 6)?;
        writer.write_i64(self.total_uncompressed_size);
        writer.write_field_begin(CompactType::I64, 7)?;
        writer.write_i64(self.total_compressed_size);
        if let Some(kv) = &self.key_value_metadata {
            write_struct_list(writer, 8, kv)?;
        }
        writer.write_field_begin(CompactType::I64, 9)?;
        writer.write_i64(self.data_page_offset);
        if let Some(offset) = self.index_page_offset {
            writer.write_field_begin(CompactType::I64, 10)?;
            writer.write_i64(offset);
        }
        if let Some(offset) = self.dictionary_page_offset {
            writer.write_field_begin(CompactType::I64, 11)?;
            writer.write_i64(offset);
        }
        if let Some(stats) = &self.statistics {
            writer.write_field_begin(CompactType::Struct, 12)?;
            stats.write_to(writer)?;
        }
        if let Some(stats) = &self.encoding_stats {
            write_struct_list(writer, 13, stats)?;
        }
        if let Some(offset) = self.bloom_filter_offset {
            writer.write_field_begin(CompactType::I64, 14)?;
            writer.write_i64(offset);
        }
        if let Some(len) = self.bloom_filter_length {
            writer.write_field_begin(CompactType::I32, 15)?;
            writer.write_i32(len);
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChunk {
    pub file_path: Option<String>,
    pub file_offset: i64,
    pub meta_data: Option<ColumnMetaData>,
    pub offset_index_offset: Option<i64>,
    pub offset_index_length: Option<i32>,
    pub column_index_offset: Option<i64>,
    pub column_index_length: Option<i32>,
}

impl CompactSerialize for ColumnChunk {
    fn read_from(reader: &mut CompactReader) -> Result<Self> {
        reader.begin_struct();
        let mut file_path = None;
        let mut file_offset = None;
        let mut meta_data = None;
        let mut offset_index_offset = None;
        let mut offset_index_length = None;
        let mut column_index_offset = None;
        let mut column_index_length = None;

        while let Some(field) = reader.read_next_field()? {
            match field.id {
                1 => {
                    expect_type(reader, &field, CompactType::Binary)?;
                    file_path = Some(reader.read_string()?);
                }
                2 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    file_offset = Some(reader.read_i64()?);
                }
                3 => {
                    expect_type(reader, &field, CompactType::Struct)?;
                    meta_data = Some(ColumnMetaData::read_from(reader)?);
                }
                4 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    offset_index_offset = Some(reader.read_i64()?);
                }
                5 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    offset_index_length = Some(reader.read_i32()?);
                }
                6 => {
                    expect_type(reader, &field, CompactType::I64)?;
                    column_index_offset = Some(reader.read_i64()?);
                }
                7 => {
                    expect_type(reader, &field, CompactType::I32)?;
                    column_index_length = Some(reader.read_i32()?);
                }
                _ => reader.skip_field(field.field_type)?,
            }
        }

        let file_offset =
            file_offset.ok_or_else(|| reader.error("ColumnChunk missing required field file_offset"))?;
        reader.end_struct()?;
        Ok(ColumnChunk {
            file_path,
            file_offset,
            meta_data,
            offset_index_offset,
            offset_index_length,
            column_index_offset,
            column_index_length,
        })
    }

    fn write_to(&self, writer: &mut CompactWriter) -> Result<()> {
        writer.begin_struct();
        if let Some(path) = &self.file_path {
            writer.write_field_begin(CompactType::Binary, 1)?;
            writer.write_string(path);
        }
        writer.write_field_begin(CompactType::I64, 2)?;
        writer.write_i64(self.file_offset);
        if let Some(meta) = &self.meta_data {
            writer.write_field_begin(CompactType::Struct, 3)?;
            meta.write_to(writer)?;
        }
        if let Some(v) = self.offset_index_offset {
            writer.write_field_begin(CompactType::I64, 4)?;
            writer.write_i64(v);
        }
        if let Some(v) = self.offset_index_length {
            writer.write_field_begin(CompactType::I32, 5)?;
            writer.write_i32(v);
        }
        if let Some(v) = self.column_index_offset {
            writer.write_field_begin(CompactType::I64, 6)?;
            writer.write_i64(v);
        }
        if let Some(v) = self.column_index_length {
            writer.write_field_begin(CompactType::I32, 7)?;
            writer.write_i32(v);
        }
        writer.write_field_stop();
        writer.end_struct()
    }
}
