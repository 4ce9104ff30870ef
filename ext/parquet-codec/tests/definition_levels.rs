use parquet_codec::codec::definitions::{pack, unpack};
use parquet_codec::metadata::*;
use parquet_codec::*;
use rand::Rng;
use std::sync::Arc;

use test_helpers::leaf;

#[test]
fn test_inverse_law_random() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let max: i16 = rng.random_range(1..=4);
        let len = rng.random_range(0..64);
        let levels: Vec<i16> = (0..len).map(|_| rng.random_range(0..=max)).collect();
        let present = levels.iter().filter(|l| **l == max).count();
        let dense: Vec<i64> = (0..present).map(|_| rng.random()).collect();

        let array = unpack(&dense, &levels, max, &0).unwrap();
        assert_eq!(array.len(), levels.len());

        let packed = pack(&array, 0, array.len(), max).unwrap();
        assert_eq!(packed.values, dense);
        assert_eq!(packed.null_count, levels.iter().filter(|l| **l < max).count());
        assert_eq!(packed.packed_len(), present);

        // Nulls are re-emitted at level 0, which unpacks to the same pattern
        let again = unpack(&packed.values, &packed.definitions, max, &0).unwrap();
        assert_eq!(again, array);
    }
}

#[test]
fn test_codec_pack_unpack_strings() {
    let registry = CodecRegistry::default();
    let element = leaf("name", Type::BYTE_ARRAY, FieldRepetitionType::OPTIONAL)
        .with_converted_type(ConvertedType::UTF8);
    let codec = registry.resolve(&element).unwrap();

    let values = ColumnArray::String(TypedArray::from_options(
        vec![None, Some(Arc::from("a")), None, Some(Arc::from("b"))],
        Arc::from(""),
    ));
    let packed = codec.pack_definitions(&values, 0, 4, 1).unwrap();
    assert_eq!(packed.definitions, vec![0, 1, 0, 1]);
    assert_eq!(packed.null_count, 2);
    assert_eq!(packed.values.len(), 2);

    let unpacked = codec.unpack_definitions(&packed.values, &packed.definitions, 1).unwrap();
    assert_eq!(unpacked, values);
    assert_eq!(unpacked.value(0), Some(ParquetValue::Null));
}

#[test]
fn test_pack_sub_range() {
    let array = TypedArray::from_options(vec![Some(1), None, Some(3), Some(4)], 0);
    let packed = pack(&array, 1, 2, 2).unwrap();
    assert_eq!(packed.values, vec![3]);
    assert_eq!(packed.definitions, vec![0, 2]);
    assert_eq!(packed.null_count, 1);
}

#[test]
fn test_required_column_levels() {
    let array = TypedArray::from_vec(vec![5, 6, 7]);
    let packed = pack(&array, 0, 3, 0).unwrap();
    assert_eq!(packed.definitions, vec![0, 0, 0]);
    assert_eq!(packed.null_count, 0);
    assert_eq!(unpack(&packed.values, &packed.definitions, 0, &0).unwrap().null_count(), 0);
}

#[test]
fn test_level_errors() {
    assert!(matches!(
        unpack(&[1], &[3], 2, &0),
        Err(ParquetError::DataValidation(_))
    ));
    assert!(matches!(
        unpack(&[1], &[1, 1], 1, &0),
        Err(ParquetError::BufferUnderflow { .. })
    ));
    assert!(matches!(
        unpack(&[1, 2], &[1], 1, &0),
        Err(ParquetError::DataValidation(_))
    ));

    let nullable = TypedArray::from_options(vec![Some(1), None], 0);
    assert!(matches!(
        pack(&nullable, 0, 2, 0),
        Err(ParquetError::DataValidation(_))
    ));
    assert!(matches!(
        pack(&nullable, 1, 5, 1),
        Err(ParquetError::InvalidArgument(_))
    ));
}
