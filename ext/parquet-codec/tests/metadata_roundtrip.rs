use bytes::{BufMut, Bytes, BytesMut};
use parquet_codec::metadata::footer::{FOOTER_SIZE, PARQUET_MAGIC};
use parquet_codec::metadata::*;
use parquet_codec::traits::SchemaInspector;
use parquet_codec::*;
use std::io::Write;

use test_helpers::sample_metadata;

/// Magic, a fake data region, then the footer
fn file_bytes(metadata: &FileMetaData) -> Bytes {
    let mut out = BytesMut::new();
    out.put_slice(PARQUET_MAGIC);
    out.put_slice(&[0u8; 128]);
    out.put_slice(&encode_footer(metadata).unwrap());
    out.freeze()
}

#[test]
fn test_file_metadata_encode_decode() {
    let metadata = sample_metadata();
    let encoded = metadata.encode().unwrap();
    let decoded = FileMetaData::try_decode(encoded).unwrap();
    assert_eq!(decoded, metadata);
}

#[test]
fn test_footer_from_memory() {
    let metadata = sample_metadata();
    let bytes = file_bytes(&metadata);
    assert_eq!(&bytes[bytes.len() - 4..], PARQUET_MAGIC);

    let trailer = &bytes[bytes.len() - FOOTER_SIZE..];
    let len = decode_footer(trailer).unwrap();
    assert_eq!(len, metadata.encode().unwrap().len());

    assert_eq!(read_file_metadata(&bytes).unwrap(), metadata);
}

#[test]
fn test_footer_from_temp_file() {
    let metadata = sample_metadata();
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&file_bytes(&metadata)).unwrap();
    file.flush().unwrap();

    let decoded = read_file_metadata(&file).unwrap();
    assert_eq!(decoded, metadata);
    assert_eq!(decoded.row_groups[0].columns[1].meta_data.as_ref().unwrap().path(), "name");
}

#[test]
fn test_schema_and_statistics_from_footer() {
    let metadata = read_file_metadata(&file_bytes(&sample_metadata())).unwrap();
    let schema = Schema::try_from_elements(&metadata.schema).unwrap();
    assert_eq!(schema.field_paths(), vec!["id", "name"]);

    let registry = CodecRegistry::default();
    let row_group = &metadata.row_groups[0];
    let mut decoded = Vec::new();
    for (column, chunk) in schema.columns().iter().zip(&row_group.columns) {
        let codec = registry.resolve_column(column).unwrap();
        let stats = chunk.meta_data.as_ref().unwrap().statistics.as_ref().unwrap();
        decoded.push(codec.decode_statistics(&column.element, stats).unwrap());
    }

    assert_eq!(
        decoded[0],
        (Some(ParquetValue::Int64(1)), Some(ParquetValue::Int64(3)))
    );
    assert_eq!(
        decoded[1],
        (
            Some(ParquetValue::String("alice".into())),
            Some(ParquetValue::String("carol".into()))
        )
    );
}

#[test]
fn test_key_value_metadata() {
    let mut metadata = sample_metadata();
    metadata
        .key_value_metadata
        .get_or_insert_with(Vec::new)
        .push(KeyValue::new("writer", "other"));
    let map = metadata.key_value_map();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("writer"), Some(&Some("other".to_string())));
}

#[test]
fn test_bad_magic() {
    let mut bytes = file_bytes(&sample_metadata()).to_vec();
    let n = bytes.len();
    bytes[n - 1] = b'X';
    let err = read_file_metadata(&Bytes::from(bytes)).unwrap_err();
    assert!(matches!(err, ParquetError::DataValidation(_)));
}

#[test]
fn test_declared_length_past_start() {
    let mut out = BytesMut::new();
    out.put_slice(PARQUET_MAGIC);
    out.put_u32_le(1_000);
    out.put_slice(PARQUET_MAGIC);
    let err = read_file_metadata(&out.freeze()).unwrap_err();
    assert!(matches!(err, ParquetError::BufferUnderflow { .. }));
}

#[test]
fn test_too_small_file() {
    let err = read_file_metadata(&Bytes::from_static(b"PAR1PAR1")).unwrap_err();
    assert!(matches!(err, ParquetError::DataValidation(_)));
}
