//! Page-level decoding and encoding for a single leaf column.

use bytes::{Bytes, BytesMut};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::buffer::ReadCursor;
use crate::codec::{AnyCodec, ColumnArray};
use crate::compression::{Compressor, Decompressor, Uncompressed};
use crate::metadata::{CompressionCodec, Statistics};
use crate::schema::ColumnDescriptor;
use crate::value::ParquetValue;
use crate::{ParquetError, Result};

/// A PLAIN data page with its definition levels already decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPage {
    pub values: Bytes,
    /// Slots in the page, nulls included
    pub num_values: usize,
    /// One level per slot; `None` for required columns
    pub definition_levels: Option<Vec<i16>>,
    pub codec: CompressionCodec,
    pub uncompressed_size: usize,
}

impl DataPage {
    /// An uncompressed page.
    pub fn new(values: Bytes, num_values: usize, definition_levels: Option<Vec<i16>>) -> Self {
        Self {
            uncompressed_size: values.len(),
            values,
            num_values,
            definition_levels,
            codec: CompressionCodec::UNCOMPRESSED,
        }
    }
}

/// Output of [`ColumnWriter::encode_page`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPage {
    pub values: Bytes,
    pub definition_levels: Option<Vec<i16>>,
    pub null_count: usize,
    pub num_values: usize,
    pub codec: CompressionCodec,
    pub uncompressed_size: usize,
}

impl EncodedPage {
    pub fn into_data_page(self) -> DataPage {
        DataPage {
            values: self.values,
            num_values: self.num_values,
            definition_levels: self.definition_levels,
            codec: self.codec,
            uncompressed_size: self.uncompressed_size,
        }
    }
}

pub struct ColumnReader {
    descriptor: ColumnDescriptor,
    codec: Arc<AnyCodec>,
    decompressor: Arc<dyn Decompressor>,
}

impl fmt::Debug for ColumnReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnReader")
            .field("column", &self.descriptor.path_string())
            .field("codec", &self.codec.name())
            .finish()
    }
}

impl ColumnReader {
    pub fn new(descriptor: ColumnDescriptor, codec: Arc<AnyCodec>) -> Self {
        Self {
            descriptor,
            codec,
            decompressor: Arc::new(Uncompressed),
        }
    }

    pub fn with_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = decompressor;
        self
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    /// Decodes one page into a column array of `num_values` slots.
    ///
    /// Values are read into a pooled scratch array. For required columns
    /// that array is returned as is and goes back to its pool when the
    /// caller drops it. For nullable columns it is expanded through the
    /// definition levels and released before returning.
    pub fn decode_page(&self, page: DataPage) -> Result<ColumnArray> {
        let max = self.descriptor.max_definition_level;
        let present = match (&page.definition_levels, max) {
            (_, 0) => page.num_values,
            (Some(levels), _) if levels.len() == page.num_values => {
                levels.iter().filter(|level| **level == max).count()
            }
            (Some(levels), _) => {
                return Err(ParquetError::data_validation(format!(
                    "column '{}': page has {} values but {} definition levels",
                    self.descriptor.path_string(),
                    page.num_values,
                    levels.len()
                )))
            }
            (None, _) => {
                return Err(ParquetError::data_validation(format!(
                    "column '{}' is nullable but the page has no definition levels",
                    self.descriptor.path_string()
                )))
            }
        };

        let data = self
            .decompressor
            .decompress(page.codec, page.values, page.uncompressed_size)?;
        // Booleans pack eight values per byte; every other type needs at
        // least one byte per value.
        let capacity = data.len().saturating_mul(8);
        if present > capacity {
            return Err(ParquetError::underflow(0, present, capacity));
        }
        debug!(
            column = %self.descriptor.path_string(),
            codec = self.codec.name(),
            num_values = page.num_values,
            present,
            bytes = data.len(),
            "decoding page"
        );

        let element = &self.descriptor.element;
        let mut cursor = ReadCursor::new(data);
        let mut scratch = self.codec.allocate(present, true, false);
        let read = self.codec.read(&mut cursor, element, &mut scratch, 0)?;
        if read < present {
            return Err(ParquetError::data_validation(format!(
                "column '{}': page declares {} values but holds {}",
                self.descriptor.path_string(),
                present,
                read
            )));
        }
        if !cursor.is_empty() {
            trace!(trailing = cursor.remaining(), "ignoring trailing page bytes");
        }

        match page.definition_levels {
            Some(levels) if max > 0 => self.codec.unpack_definitions(&scratch, &levels, max),
            _ => Ok(scratch),
        }
    }

    /// Decoded `(min, max)` for this column's chunk statistics.
    pub fn decode_statistics(
        &self,
        statistics: &Statistics,
    ) -> Result<(Option<ParquetValue>, Option<ParquetValue>)> {
        self.codec
            .decode_statistics(&self.descriptor.element, statistics)
    }
}

pub struct ColumnWriter {
    descriptor: ColumnDescriptor,
    codec: Arc<AnyCodec>,
    compression: CompressionCodec,
    compressor: Arc<dyn Compressor>,
}

impl fmt::Debug for ColumnWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnWriter")
            .field("column", &self.descriptor.path_string())
            .field("codec", &self.codec.name())
            .field("compression", &self.compression)
            .finish()
    }
}

impl ColumnWriter {
    pub fn new(descriptor: ColumnDescriptor, codec: Arc<AnyCodec>) -> Self {
        Self {
            descriptor,
            codec,
            compression: CompressionCodec::UNCOMPRESSED,
            compressor: Arc::new(Uncompressed),
        }
    }

    pub fn with_compressor(
        mut self,
        compression: CompressionCodec,
        compressor: Arc<dyn Compressor>,
    ) -> Self {
        self.compression = compression;
        self.compressor = compressor;
        self
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    /// Encodes slots `offset..offset + count` of `values` as one page.
    pub fn encode_page(&self, values: &ColumnArray, offset: usize, count: usize) -> Result<EncodedPage> {
        let max = self.descriptor.max_definition_level;
        let packed = self.codec.pack_definitions(values, offset, count, max)?;

        let mut out = BytesMut::new();
        self.codec.write(
            &mut out,
            &self.descriptor.element,
            &packed.values,
            0,
            packed.values.len(),
        )?;
        let uncompressed_size = out.len();
        let encoded = self.compressor.compress(self.compression, out.freeze())?;

        debug!(
            column = %self.descriptor.path_string(),
            num_values = count,
            null_count = packed.null_count,
            bytes = uncompressed_size,
            "encoded page"
        );

        Ok(EncodedPage {
            values: encoded,
            definition_levels: (max > 0).then_some(packed.definitions),
            null_count: packed.null_count,
            num_values: count,
            codec: self.compression,
            uncompressed_size,
        })
    }
}
