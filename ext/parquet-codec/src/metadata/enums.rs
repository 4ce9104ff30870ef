//! Integer-coded enums of the Parquet footer.

use std::fmt;

use crate::thrift::{CompactReader, FieldHeader};
use crate::Result;

macro_rules! thrift_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(non_camel_case_types)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Integer value on the wire.
            pub fn to_thrift(self) -> i32 {
                match self {
                    $($name::$variant => $value),+
                }
            }

            pub fn from_thrift(value: i32) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Reads the enum as an i32 field value.
            pub(crate) fn read(reader: &mut CompactReader, field: &FieldHeader) -> Result<Self> {
                let raw = reader.read_i32()?;
                Self::from_thrift(raw).ok_or_else(|| {
                    reader.error(format!(
                        "field {}: invalid {} value {}",
                        field.id,
                        stringify!($name),
                        raw
                    ))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

thrift_enum!(
    /// Physical storage type of a leaf column.
    Type {
        BOOLEAN = 0,
        INT32 = 1,
        INT64 = 2,
        INT96 = 3,
        FLOAT = 4,
        DOUBLE = 5,
        BYTE_ARRAY = 6,
        FIXED_LEN_BYTE_ARRAY = 7,
    }
);

thrift_enum!(
    /// Legacy logical annotation of a schema element.
    ConvertedType {
        UTF8 = 0,
        MAP = 1,
        MAP_KEY_VALUE = 2,
        LIST = 3,
        ENUM = 4,
        DECIMAL = 5,
        DATE = 6,
        TIME_MILLIS = 7,
        TIME_MICROS = 8,
        TIMESTAMP_MILLIS = 9,
        TIMESTAMP_MICROS = 10,
        UINT_8 = 11,
        UINT_16 = 12,
        UINT_32 = 13,
        UINT_64 = 14,
        INT_8 = 15,
        INT_16 = 16,
        INT_32 = 17,
        INT_64 = 18,
        JSON = 19,
        BSON = 20,
        INTERVAL = 21,
    }
);

thrift_enum!(
    FieldRepetitionType {
        REQUIRED = 0,
        OPTIONAL = 1,
        REPEATED = 2,
    }
);

thrift_enum!(
    Encoding {
        PLAIN = 0,
        PLAIN_DICTIONARY = 2,
        RLE = 3,
        BIT_PACKED = 4,
        DELTA_BINARY_PACKED = 5,
        DELTA_LENGTH_BYTE_ARRAY = 6,
        DELTA_BYTE_ARRAY = 7,
        RLE_DICTIONARY = 8,
        BYTE_STREAM_SPLIT = 9,
    }
);

thrift_enum!(
    CompressionCodec {
        UNCOMPRESSED = 0,
        SNAPPY = 1,
        GZIP = 2,
        LZO = 3,
        BROTLI = 4,
        LZ4 = 5,
        ZSTD = 6,
        LZ4_RAW = 7,
    }
);

thrift_enum!(
    PageType {
        DATA_PAGE = 0,
        INDEX_PAGE = 1,
        DICTIONARY_PAGE = 2,
        DATA_PAGE_V2 = 3,
    }
);

impl Type {
    /// Width in bytes of one PLAIN value, `None` for variable or
    /// schema-dependent widths.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Type::INT32 | Type::FLOAT => Some(4),
            Type::INT64 | Type::DOUBLE => Some(8),
            Type::INT96 => Some(12),
            Type::BOOLEAN | Type::BYTE_ARRAY | Type::FIXED_LEN_BYTE_ARRAY => None,
        }
    }
}
