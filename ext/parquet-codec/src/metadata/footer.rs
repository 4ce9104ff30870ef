//! The `PAR1` trailer that frames the file metadata.
//!
//! A file is laid out as `PAR1 <column data> <metadata> <u32 LE length> PAR1`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use super::file::FileMetaData;
use crate::{ParquetError, Result};

/// Length of the trailer: metadata length plus magic.
pub const FOOTER_SIZE: usize = 8;

pub const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

/// A byte source that can serve arbitrary ranges.
pub trait ChunkSource {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_range(&self, offset: u64, length: usize) -> Result<Bytes>;
}

impl ChunkSource for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }

    fn read_range(&self, offset: u64, length: usize) -> Result<Bytes> {
        let start = usize::try_from(offset)
            .map_err(|_| ParquetError::invalid_argument(format!("offset {} out of range", offset)))?;
        let available = Bytes::len(self).saturating_sub(start);
        if length > available {
            return Err(ParquetError::underflow(start, length, available));
        }
        Ok(self.slice(start..start + length))
    }
}

impl ChunkSource for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }

    fn read_range(&self, offset: u64, length: usize) -> Result<Bytes> {
        let mut handle = self;
        handle.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length];
        handle.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

/// Parses the 8-byte trailer and returns the metadata length.
pub fn decode_footer(trailer: &[u8]) -> Result<usize> {
    if trailer.len() < FOOTER_SIZE {
        return Err(ParquetError::underflow(0, FOOTER_SIZE, trailer.len()));
    }
    let tail = &trailer[trailer.len() - FOOTER_SIZE..];
    if &tail[4..] != PARQUET_MAGIC {
        return Err(ParquetError::data_validation(
            "invalid Parquet file: trailing magic is not PAR1",
        ));
    }
    let len = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
    Ok(len as usize)
}

/// Reads and decodes the file metadata from the end of `source`.
pub fn read_file_metadata<S: ChunkSource + ?Sized>(source: &S) -> Result<FileMetaData> {
    let file_len = source.len();
    let min_len = (FOOTER_SIZE + PARQUET_MAGIC.len()) as u64;
    if file_len < min_len {
        return Err(ParquetError::data_validation(format!(
            "file of {} bytes is too small to be Parquet",
            file_len
        )));
    }

    let trailer = source.read_range(file_len - FOOTER_SIZE as u64, FOOTER_SIZE)?;
    let metadata_len = decode_footer(&trailer)?;
    trace!(metadata_len, file_len, "read footer trailer");

    let available = file_len - min_len;
    if metadata_len as u64 > available {
        return Err(ParquetError::underflow(
            (file_len - FOOTER_SIZE as u64) as usize,
            metadata_len,
            available as usize,
        ));
    }
    let start = file_len - FOOTER_SIZE as u64 - metadata_len as u64;
    let payload = source.read_range(start, metadata_len)?;
    let metadata = FileMetaData::try_decode(payload)?;
    debug!(metadata_len, num_rows = metadata.num_rows, "read file metadata");
    Ok(metadata)
}

/// Encodes `metadata` followed by its length and the closing magic.
pub fn encode_footer(metadata: &FileMetaData) -> Result<Bytes> {
    let payload = metadata.encode()?;
    let len = u32::try_from(payload.len()).map_err(|_| {
        ParquetError::invalid_argument(format!("metadata of {} bytes is too large", payload.len()))
    })?;
    let mut out = BytesMut::with_capacity(payload.len() + FOOTER_SIZE);
    out.put_slice(&payload);
    out.put_u32_le(len);
    out.put_slice(PARQUET_MAGIC);
    Ok(out.freeze())
}
