use parquet_codec::column::{ColumnReader, ColumnWriter};
use parquet_codec::metadata::*;
use parquet_codec::*;
use std::sync::Arc;
use std::thread;

use test_helpers::leaf;

#[test]
fn test_concurrent_page_decoding() {
    // One registry, and therefore one set of pools, shared by every thread
    let registry = Arc::new(CodecRegistry::default());
    let descriptor = ColumnDescriptor::new_top_level(
        leaf("value", Type::BYTE_ARRAY, FieldRepetitionType::OPTIONAL)
            .with_converted_type(ConvertedType::UTF8),
    );
    let codec = registry.resolve_column(&descriptor).unwrap();

    let values: Vec<Option<Arc<str>>> = (0..1000)
        .map(|i| (i % 7 != 0).then(|| Arc::from(format!("Value {}", i))))
        .collect();
    let input = ColumnArray::String(TypedArray::from_options(values, Arc::from("")));
    let page = ColumnWriter::new(descriptor.clone(), Arc::clone(&codec))
        .encode_page(&input, 0, 1000)
        .unwrap();
    let page = Arc::new(page.into_data_page());
    let expected = Arc::new(input);

    let num_threads = 8;
    let mut handles = vec![];
    for _ in 0..num_threads {
        let registry = Arc::clone(&registry);
        let descriptor = descriptor.clone();
        let page = Arc::clone(&page);
        let expected = Arc::clone(&expected);

        handles.push(thread::spawn(move || {
            let codec = registry.resolve_column(&descriptor).unwrap();
            let reader = ColumnReader::new(descriptor, codec);
            for _ in 0..20 {
                let decoded = reader.decode_page((*page).clone()).unwrap();
                assert_eq!(&decoded, expected.as_ref());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.cached(), 1);
    assert_eq!(registry.pools().outstanding(), 0);
    assert!(registry.pools().string.available() >= 1);
}

#[test]
fn test_concurrent_resolution_returns_one_codec() {
    let registry = Arc::new(CodecRegistry::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let element = leaf("n", Type::INT64, FieldRepetitionType::REQUIRED);
                registry.resolve(&element).unwrap()
            })
        })
        .collect();

    let codecs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(registry.cached(), 1);
    // Racing resolvers may build duplicates, but all get the cached instance
    let cached = registry
        .resolve(&leaf("n", Type::INT64, FieldRepetitionType::REQUIRED))
        .unwrap();
    assert!(codecs.iter().all(|c| Arc::ptr_eq(c, &cached)));
}

#[test]
fn test_pool_shared_across_threads() {
    let pools = codec::PoolSet::new(4);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = pools.int64.clone();
            thread::spawn(move || {
                for n in 0..50 {
                    let mut rented = pool.rent(n + i, &0);
                    rented.iter_mut().for_each(|v| *v = n as i64);
                    assert!(rented.iter().all(|v| *v == n as i64));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(pools.outstanding(), 0);
    assert!(pools.int64.available() <= 4);
}
