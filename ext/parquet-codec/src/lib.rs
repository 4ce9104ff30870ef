//! Parquet metadata and PLAIN value codecs
//!
//! `parquet-codec` covers the byte-level pieces of the Parquet format that
//! sit below a row or column reader: the footer, the values inside data
//! pages, and the definition levels that mark nulls.
//!
//! # Key Components
//!
//! - **Thrift**: Compact protocol reader and writer
//!   - Field-delta headers, zigzag varints, lists and nested structs
//!   - Unknown fields are skipped, missing required fields are errors
//!
//! - **Metadata**: Footer structures
//!   - [`metadata::FileMetaData`] with row groups, column chunks and statistics
//!   - Footer location and magic handling in [`metadata::footer`]
//!
//! - **Schema**: Nested schema rebuilt from the flat element list
//!   - Leaf [`ColumnDescriptor`]s with definition and repetition levels
//!   - Introspection through the [`traits::SchemaInspector`] trait
//!
//! - **Codecs**: One PLAIN codec per supported column type
//!   - Resolved once per column by [`CodecRegistry`]
//!   - Decoded values land in pooled [`TypedArray`]s
//!   - Definition-level packing for nullable columns
//!
//! - **Pages**: [`column::ColumnReader`] and [`column::ColumnWriter`] tie a
//!   codec, definition levels and optional compression together
//!
//! # Example Usage
//!
//! ```no_run
//! use parquet_codec::metadata::read_file_metadata;
//! use parquet_codec::{CodecRegistry, FormatOptions, Schema};
//!
//! # fn main() -> parquet_codec::Result<()> {
//! let file = std::fs::File::open("data.parquet")?;
//! let metadata = read_file_metadata(&file)?;
//! let schema = Schema::try_from_elements(&metadata.schema)?;
//! let registry = CodecRegistry::new(FormatOptions::default());
//! for column in schema.columns() {
//!     let codec = registry.resolve_column(column)?;
//!     println!("{} -> {}", column.path_string(), codec.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod codec;
pub mod column;
pub mod compression;
pub mod error;
pub mod metadata;
pub mod options;
pub mod schema;
pub mod thrift;
pub mod traits;
pub mod value;

#[cfg(test)]
pub mod test_utils;

pub use buffer::ReadCursor;
pub use codec::{AnyCodec, CodecRegistry, ColumnArray, DataCodec, TypedArray};
pub use error::{ErrorContext, ParquetError, Result};
pub use options::FormatOptions;
pub use schema::{ColumnDescriptor, Schema, SchemaBuilder, SchemaNode};
pub use value::{Decimal, Interval, ParquetValue};
