//! Page compression hooks.
//!
//! Only the pass-through implementation ships with this crate. Real codecs
//! plug in by implementing [`Decompressor`] and [`Compressor`].

use bytes::Bytes;

use crate::metadata::CompressionCodec;
use crate::{ParquetError, Result};

pub trait Decompressor: Send + Sync {
    /// Expands `data`, which was compressed with `codec`, to
    /// `uncompressed_size` bytes.
    fn decompress(&self, codec: CompressionCodec, data: Bytes, uncompressed_size: usize) -> Result<Bytes>;
}

pub trait Compressor: Send + Sync {
    fn compress(&self, codec: CompressionCodec, data: Bytes) -> Result<Bytes>;
}

/// Accepts `UNCOMPRESSED` pages only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncompressed;

impl Decompressor for Uncompressed {
    fn decompress(&self, codec: CompressionCodec, data: Bytes, uncompressed_size: usize) -> Result<Bytes> {
        match codec {
            CompressionCodec::UNCOMPRESSED if data.len() == uncompressed_size => Ok(data),
            CompressionCodec::UNCOMPRESSED => Err(ParquetError::data_validation(format!(
                "uncompressed page is {} bytes but declares {}",
                data.len(),
                uncompressed_size
            ))),
            other => Err(ParquetError::unsupported(format!("compression codec {}", other))),
        }
    }
}

impl Compressor for Uncompressed {
    fn compress(&self, codec: CompressionCodec, data: Bytes) -> Result<Bytes> {
        match codec {
            CompressionCodec::UNCOMPRESSED => Ok(data),
            other => Err(ParquetError::unsupported(format!("compression codec {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        let data = Bytes::from_static(b"abc");
        let out = Uncompressed
            .decompress(CompressionCodec::UNCOMPRESSED, data.clone(), 3)
            .unwrap();
        assert_eq!(out, data);
        assert_eq!(
            Uncompressed.compress(CompressionCodec::UNCOMPRESSED, data.clone()).unwrap(),
            data
        );
    }

    #[test]
    fn test_size_mismatch() {
        let err = Uncompressed
            .decompress(CompressionCodec::UNCOMPRESSED, Bytes::from_static(b"abc"), 4)
            .unwrap_err();
        assert!(matches!(err, ParquetError::DataValidation(_)));
    }

    #[test]
    fn test_other_codecs_unsupported() {
        let err = Uncompressed
            .compress(CompressionCodec::ZSTD, Bytes::new())
            .unwrap_err();
        assert!(matches!(err, ParquetError::Unsupported(_)));
        assert!(err.to_string().contains("ZSTD"));
    }
}
