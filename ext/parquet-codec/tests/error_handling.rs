use bytes::Bytes;
use parquet_codec::buffer::ReadCursor;
use parquet_codec::metadata::*;
use parquet_codec::thrift::*;
use parquet_codec::*;

use test_helpers::leaf;

// ====== Codec Resolution Errors ======

#[test]
fn test_no_codec_for_annotation() {
    let registry = CodecRegistry::default();
    let element = leaf("m", Type::INT64, FieldRepetitionType::REQUIRED)
        .with_converted_type(ConvertedType::JSON);
    let err = registry.resolve(&element).unwrap_err();
    assert!(matches!(err, ParquetError::CodecMismatch(_)));
    assert!(err.to_string().contains("'m'"));
    assert_eq!(registry.cached(), 0);
}

#[test]
fn test_uuid_with_wrong_width() {
    let registry = CodecRegistry::default();
    let element = leaf("u", Type::FIXED_LEN_BYTE_ARRAY, FieldRepetitionType::REQUIRED)
        .with_type_length(8)
        .with_logical_type(LogicalType::Uuid);
    let codec = registry.resolve(&element).unwrap();
    let mut dest = codec.allocate(1, false, false);
    let mut cursor = ReadCursor::new(vec![0u8; 8]);
    assert!(codec.read(&mut cursor, &element, &mut dest, 0).is_err());
}

// ====== Buffer Errors ======

#[test]
fn test_length_prefix_past_end() {
    let registry = CodecRegistry::default();
    let element = leaf("b", Type::BYTE_ARRAY, FieldRepetitionType::REQUIRED);
    let codec = registry.resolve(&element).unwrap();

    let mut data = 10u32.to_le_bytes().to_vec();
    data.extend_from_slice(b"abc");
    let mut cursor = ReadCursor::new(data);
    let mut dest = codec.allocate(1, false, false);
    let err = codec.read(&mut cursor, &element, &mut dest, 0).unwrap_err();
    match err {
        ParquetError::BufferUnderflow { needed, remaining, .. } => {
            assert_eq!(needed, 10);
            assert_eq!(remaining, 3);
        }
        other => panic!("expected underflow, got {:?}", other),
    }
}

#[test]
fn test_invalid_utf8() {
    let element = leaf("s", Type::BYTE_ARRAY, FieldRepetitionType::REQUIRED)
        .with_converted_type(ConvertedType::UTF8);
    let mut data = 2u32.to_le_bytes().to_vec();
    data.extend_from_slice(&[0xFF, b'a']);

    let strict = CodecRegistry::default();
    let codec = strict.resolve(&element).unwrap();
    let mut dest = codec.allocate(1, false, false);
    let err = codec
        .read(&mut ReadCursor::new(data.clone()), &element, &mut dest, 0)
        .unwrap_err();
    assert!(matches!(err, ParquetError::Utf8(_)));

    let lossy = CodecRegistry::new(FormatOptions::new().with_lossy_utf8(true));
    let codec = lossy.resolve(&element).unwrap();
    let mut dest = codec.allocate(1, false, false);
    codec
        .read(&mut ReadCursor::new(data), &element, &mut dest, 0)
        .unwrap();
    assert_eq!(dest.value(0), Some(ParquetValue::String("\u{FFFD}a".into())));
}

#[test]
fn test_offset_past_destination() {
    let registry = CodecRegistry::default();
    let element = leaf("i", Type::INT32, FieldRepetitionType::REQUIRED);
    let codec = registry.resolve(&element).unwrap();
    let mut dest = codec.allocate(2, false, false);
    let err = codec
        .read(&mut ReadCursor::new(vec![0u8; 4]), &element, &mut dest, 3)
        .unwrap_err();
    assert!(matches!(err, ParquetError::InvalidArgument(_)));
}

// ====== Protocol Errors ======

#[test]
fn test_missing_required_field_names_struct() {
    // RowGroup with only num_rows (field 3)
    let mut writer = CompactWriter::new();
    writer.begin_struct();
    writer.write_field_begin(CompactType::I64, 3).unwrap();
    writer.write_i64(10);
    writer.write_field_stop();
    writer.end_struct().unwrap();

    let mut reader = CompactReader::new(writer.into_bytes());
    let err = RowGroup::read_from(&mut reader).unwrap_err();
    assert!(err.is_protocol());
    assert!(err.to_string().contains("RowGroup"), "{}", err);
}

#[test]
fn test_garbage_metadata() {
    let err = FileMetaData::try_decode(Bytes::from_static(&[0xFF, 0xFF, 0xFF])).unwrap_err();
    assert!(err.is_protocol(), "{}", err);
}

#[test]
fn test_invalid_enum_value() {
    // SchemaElement { 1: type = 42, 4: name = "x" }
    let mut writer = CompactWriter::new();
    writer.begin_struct();
    writer.write_field_begin(CompactType::I32, 1).unwrap();
    writer.write_i32(42);
    writer.write_field_begin(CompactType::Binary, 4).unwrap();
    writer.write_string("x");
    writer.write_field_stop();
    writer.end_struct().unwrap();

    let mut reader = CompactReader::new(writer.into_bytes());
    let err = SchemaElement::read_from(&mut reader).unwrap_err();
    assert!(err.is_protocol());
    assert!(err.to_string().contains("invalid Type value 42"), "{}", err);
}

// ====== Error Context ======

#[test]
fn test_error_context_chain() {
    let result: Result<()> = Err(ParquetError::schema("bad leaf"));
    let err = result.context("loading column 'x'").unwrap_err();
    assert!(err.to_string().contains("loading column 'x'"));
    assert!(err.to_string().contains("bad leaf"));
}
