//! Codec resolution and type-erased dispatch.

use bytes::BytesMut;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{
    BooleanCodec, ByteArrayCodec, ColumnArray, ColumnValue, DataCodec, DateCodec, DecimalCodec,
    FixedLenByteArrayCodec, Int96Codec, IntervalCodec, PoolSet, PrimitiveCodec, StringCodec,
    TimeCodec, TimestampCodec, TypedArray, UuidCodec,
};
use crate::buffer::ReadCursor;
use crate::metadata::{ColumnAnnotation, SchemaElement, Statistics, TimeUnit, Type};
use crate::options::FormatOptions;
use crate::schema::ColumnDescriptor;
use crate::value::ParquetValue;
use crate::{ParquetError, Result};

/// One concrete codec per supported column type.
#[derive(Debug)]
pub enum AnyCodec {
    Boolean(BooleanCodec),
    Int8(PrimitiveCodec<i8>),
    Int16(PrimitiveCodec<i16>),
    Int32(PrimitiveCodec<i32>),
    Int64(PrimitiveCodec<i64>),
    UInt8(PrimitiveCodec<u8>),
    UInt16(PrimitiveCodec<u16>),
    UInt32(PrimitiveCodec<u32>),
    UInt64(PrimitiveCodec<u64>),
    Float(PrimitiveCodec<f32>),
    Double(PrimitiveCodec<f64>),
    Int96(Int96Codec),
    Decimal(DecimalCodec),
    Date(DateCodec),
    Time(TimeCodec),
    Timestamp(TimestampCodec),
    Interval(IntervalCodec),
    Uuid(UuidCodec),
    String(StringCodec),
    ByteArray(ByteArrayCodec),
    FixedLenByteArray(FixedLenByteArrayCodec),
}

macro_rules! with_codec {
    ($codec:expr, $c:ident => $body:expr) => {
        match $codec {
            AnyCodec::Boolean($c) => $body,
            AnyCodec::Int8($c) => $body,
            AnyCodec::Int16($c) => $body,
            AnyCodec::Int32($c) => $body,
            AnyCodec::Int64($c) => $body,
            AnyCodec::UInt8($c) => $body,
            AnyCodec::UInt16($c) => $body,
            AnyCodec::UInt32($c) => $body,
            AnyCodec::UInt64($c) => $body,
            AnyCodec::Float($c) => $body,
            AnyCodec::Double($c) => $body,
            AnyCodec::Int96($c) => $body,
            AnyCodec::Decimal($c) => $body,
            AnyCodec::Date($c) => $body,
            AnyCodec::Time($c) => $body,
            AnyCodec::Timestamp($c) => $body,
            AnyCodec::Interval($c) => $body,
            AnyCodec::Uuid($c) => $body,
            AnyCodec::String($c) => $body,
            AnyCodec::ByteArray($c) => $body,
            AnyCodec::FixedLenByteArray($c) => $body,
        }
    };
}

struct Candidate {
    name: &'static str,
    matches: fn(&SchemaElement, &FormatOptions) -> bool,
    build: fn(&SchemaElement, &FormatOptions, &PoolSet) -> AnyCodec,
}

fn time_unit(element: &SchemaElement) -> TimeUnit {
    match element.annotation() {
        Some(ColumnAnnotation::Time(unit) | ColumnAnnotation::Timestamp(unit)) => unit,
        _ => TimeUnit::Millis,
    }
}

const CANDIDATES: &[Candidate] = &[
    Candidate {
        name: "Boolean",
        matches: BooleanCodec::is_match,
        build: |_, _, pools| AnyCodec::Boolean(BooleanCodec::new(pools)),
    },
    Candidate {
        name: "Int8",
        matches: PrimitiveCodec::<i8>::is_match,
        build: |_, _, pools| AnyCodec::Int8(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "Int16",
        matches: PrimitiveCodec::<i16>::is_match,
        build: |_, _, pools| AnyCodec::Int16(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "Int32",
        matches: PrimitiveCodec::<i32>::is_match,
        build: |_, _, pools| AnyCodec::Int32(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "Int64",
        matches: PrimitiveCodec::<i64>::is_match,
        build: |_, _, pools| AnyCodec::Int64(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "UInt8",
        matches: PrimitiveCodec::<u8>::is_match,
        build: |_, _, pools| AnyCodec::UInt8(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "UInt16",
        matches: PrimitiveCodec::<u16>::is_match,
        build: |_, _, pools| AnyCodec::UInt16(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "UInt32",
        matches: PrimitiveCodec::<u32>::is_match,
        build: |_, _, pools| AnyCodec::UInt32(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "UInt64",
        matches: PrimitiveCodec::<u64>::is_match,
        build: |_, _, pools| AnyCodec::UInt64(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "Float",
        matches: PrimitiveCodec::<f32>::is_match,
        build: |_, _, pools| AnyCodec::Float(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "Double",
        matches: PrimitiveCodec::<f64>::is_match,
        build: |_, _, pools| AnyCodec::Double(PrimitiveCodec::new(pools)),
    },
    Candidate {
        name: "Int96",
        matches: Int96Codec::is_match,
        build: |_, _, pools| AnyCodec::Int96(Int96Codec::new(pools)),
    },
    Candidate {
        name: "Decimal",
        matches: DecimalCodec::is_match,
        build: |element, _, pools| {
            let (precision, scale) = match element.annotation() {
                Some(ColumnAnnotation::Decimal { precision, scale }) => (precision, scale),
                _ => (0, 0),
            };
            AnyCodec::Decimal(DecimalCodec::new(precision, scale, pools))
        },
    },
    Candidate {
        name: "Date",
        matches: DateCodec::is_match,
        build: |_, _, pools| AnyCodec::Date(DateCodec::new(pools)),
    },
    Candidate {
        name: "Time",
        matches: TimeCodec::is_match,
        build: |element, _, pools| AnyCodec::Time(TimeCodec::new(time_unit(element), pools)),
    },
    Candidate {
        name: "Timestamp",
        matches: TimestampCodec::is_match,
        build: |element, _, pools| {
            AnyCodec::Timestamp(TimestampCodec::new(time_unit(element), pools))
        },
    },
    Candidate {
        name: "Interval",
        matches: IntervalCodec::is_match,
        build: |_, _, pools| AnyCodec::Interval(IntervalCodec::new(pools)),
    },
    Candidate {
        name: "Uuid",
        matches: UuidCodec::is_match,
        build: |_, _, pools| AnyCodec::Uuid(UuidCodec::new(pools)),
    },
    Candidate {
        name: "String",
        matches: StringCodec::is_match,
        build: |_, options, pools| AnyCodec::String(StringCodec::new(pools, options)),
    },
    Candidate {
        name: "ByteArray",
        matches: ByteArrayCodec::is_match,
        build: |_, _, pools| AnyCodec::ByteArray(ByteArrayCodec::new(pools)),
    },
    Candidate {
        name: "FixedLenByteArray",
        matches: FixedLenByteArrayCodec::is_match,
        build: |_, _, pools| AnyCodec::FixedLenByteArray(FixedLenByteArrayCodec::new(pools)),
    },
];

/// Dense values of a packed column slice plus their definition levels.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedColumn {
    pub values: ColumnArray,
    pub definitions: Vec<i16>,
    pub null_count: usize,
}

fn downcast<'a, C: DataCodec>(
    codec: &C,
    array: &'a ColumnArray,
) -> Result<&'a TypedArray<C::Value>> {
    <C::Value as ColumnValue>::from_column(array).ok_or_else(|| {
        ParquetError::invalid_argument(format!(
            "{} codec cannot use a {} array",
            codec.name(),
            array.type_name()
        ))
    })
}

fn downcast_mut<'a, C: DataCodec>(
    codec: &C,
    array: &'a mut ColumnArray,
) -> Result<&'a mut TypedArray<C::Value>> {
    let type_name = array.type_name();
    <C::Value as ColumnValue>::from_column_mut(array).ok_or_else(|| {
        ParquetError::invalid_argument(format!(
            "{} codec cannot use a {} array",
            codec.name(),
            type_name
        ))
    })
}

fn read_typed<C: DataCodec>(
    codec: &C,
    cursor: &mut ReadCursor,
    element: &SchemaElement,
    array: &mut ColumnArray,
    offset: usize,
) -> Result<usize> {
    let typed = downcast_mut(codec, array)?;
    let count = codec.read(cursor, element, typed.values_mut(), offset)?;
    if let Some(validity) = typed.validity_mut() {
        validity[offset..offset + count].fill(true);
    }
    Ok(count)
}

fn compare_typed<C: DataCodec>(codec: &C, array: &ColumnArray, i: usize, j: usize) -> Result<Ordering> {
    let typed = downcast(codec, array)?;
    if i >= typed.len() || j >= typed.len() {
        return Err(ParquetError::invalid_argument(format!(
            "compare({}, {}) out of bounds for {} values",
            i,
            j,
            typed.len()
        )));
    }
    // Nulls sort first.
    Ok(match (typed.get(i), typed.get(j)) {
        (Some(a), Some(b)) => codec.compare(a, b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    })
}

impl AnyCodec {
    /// Picks the single codec that handles `element`.
    pub fn resolve(element: &SchemaElement, options: &FormatOptions, pools: &PoolSet) -> Result<Self> {
        if element.is_group() {
            return Err(ParquetError::codec_mismatch(format!(
                "'{}' is a group and has no value codec",
                element.name
            )));
        }
        let matching: Vec<&Candidate> = CANDIDATES
            .iter()
            .filter(|c| (c.matches)(element, options))
            .collect();
        match matching.as_slice() {
            [candidate] => Ok((candidate.build)(element, options, pools)),
            [] => Err(ParquetError::codec_mismatch(format!(
                "no codec for column '{}' ({:?}, {:?})",
                element.name,
                element.physical_type,
                element.annotation()
            ))),
            many => Err(ParquetError::codec_mismatch(format!(
                "column '{}' matches several codecs: {}",
                element.name,
                many.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        with_codec!(self, c => c.name())
    }

    /// See [`DataCodec::allocate`].
    pub fn allocate(&self, min_count: usize, use_pool: bool, is_nullable: bool) -> ColumnArray {
        with_codec!(self, c => ColumnValue::into_column(c.allocate(min_count, use_pool, is_nullable)))
    }

    /// Decodes into `dest` from `offset`, marking the written slots valid.
    pub fn read(
        &self,
        cursor: &mut ReadCursor,
        element: &SchemaElement,
        dest: &mut ColumnArray,
        offset: usize,
    ) -> Result<usize> {
        with_codec!(self, c => read_typed(c, cursor, element, dest, offset))
    }

    /// Encodes `source[offset..offset + count]`. Validity is ignored; pack
    /// nullable arrays first.
    pub fn write(
        &self,
        out: &mut BytesMut,
        element: &SchemaElement,
        source: &ColumnArray,
        offset: usize,
        count: usize,
    ) -> Result<()> {
        with_codec!(self, c => {
            let typed = downcast(c, source)?;
            c.write(out, element, typed.values(), offset, count)
        })
    }

    pub fn pack_definitions(
        &self,
        values: &ColumnArray,
        offset: usize,
        count: usize,
        max_definition_level: i16,
    ) -> Result<PackedColumn> {
        with_codec!(self, c => {
            let typed = downcast(c, values)?;
            let packed = c.pack_definitions(typed, offset, count, max_definition_level)?;
            Ok(PackedColumn {
                values: ColumnValue::into_column(TypedArray::from_vec(packed.values)),
                definitions: packed.definitions,
                null_count: packed.null_count,
            })
        })
    }

    pub fn unpack_definitions(
        &self,
        packed: &ColumnArray,
        levels: &[i16],
        max_definition_level: i16,
    ) -> Result<ColumnArray> {
        with_codec!(self, c => {
            let typed = downcast(c, packed)?;
            let unpacked = c.unpack_definitions(typed.values(), levels, max_definition_level)?;
            Ok(ColumnValue::into_column(unpacked))
        })
    }

    /// Orders slots `i` and `j` of `array`; nulls sort first.
    pub fn compare(&self, array: &ColumnArray, i: usize, j: usize) -> Result<Ordering> {
        with_codec!(self, c => compare_typed(c, array, i, j))
    }

    pub fn plain_decode(
        &self,
        element: &SchemaElement,
        encoded: Option<&[u8]>,
    ) -> Result<Option<ParquetValue>> {
        with_codec!(self, c => Ok(c.plain_decode(element, encoded)?.map(|v| v.to_value())))
    }

    /// Decoded `(min, max)` of a chunk's statistics.
    pub fn decode_statistics(
        &self,
        element: &SchemaElement,
        statistics: &Statistics,
    ) -> Result<(Option<ParquetValue>, Option<ParquetValue>)> {
        let (min, max) = statistics.min_max_bytes();
        Ok((self.plain_decode(element, min)?, self.plain_decode(element, max)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CodecKey {
    physical: Option<Type>,
    annotation: Option<ColumnAnnotation>,
    type_length: Option<i32>,
    treat_as_string: bool,
}

/// Resolves and caches codecs for one set of [`FormatOptions`].
///
/// All codecs handed out share the registry's [`PoolSet`].
#[derive(Debug)]
pub struct CodecRegistry {
    options: FormatOptions,
    pools: PoolSet,
    cache: RwLock<HashMap<CodecKey, Arc<AnyCodec>>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new(FormatOptions::default())
    }
}

impl CodecRegistry {
    pub fn new(options: FormatOptions) -> Self {
        Self {
            pools: PoolSet::new(options.pool_retention),
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    pub fn pools(&self) -> &PoolSet {
        &self.pools
    }

    /// Number of distinct codecs resolved so far.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    pub fn resolve(&self, element: &SchemaElement) -> Result<Arc<AnyCodec>> {
        let key = CodecKey {
            physical: element.physical_type,
            annotation: element.annotation(),
            type_length: element.type_length,
            treat_as_string: self.options.treat_byte_array_as_string,
        };
        if let Some(codec) = self.cache.read().get(&key) {
            return Ok(Arc::clone(codec));
        }

        let codec = Arc::new(AnyCodec::resolve(element, &self.options, &self.pools)?);
        debug!(
            column = %element.name,
            codec = codec.name(),
            "resolved column codec"
        );
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(key).or_insert(codec)))
    }

    pub fn resolve_column(&self, column: &ColumnDescriptor) -> Result<Arc<AnyCodec>> {
        self.resolve(&column.element)
    }
}
