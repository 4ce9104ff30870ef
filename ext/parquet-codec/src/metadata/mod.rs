//! Parquet footer structures and their compact-protocol serialization.

mod column_chunk;
mod enums;
mod file;
pub mod footer;
mod logical_type;
mod schema_element;
mod statistics;

pub use column_chunk::{ColumnChunk, ColumnMetaData, KeyValue, PageEncodingStats};
pub use enums::{CompressionCodec, ConvertedType, Encoding, FieldRepetitionType, PageType, Type};
pub use file::{ColumnOrder, FileMetaData, RowGroup, SortingColumn};
pub use footer::{decode_footer, encode_footer, read_file_metadata, ChunkSource};
pub use logical_type::{LogicalType, TimeUnit};
pub use schema_element::{ColumnAnnotation, SchemaElement};
pub use statistics::Statistics;
