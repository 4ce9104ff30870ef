//! Forward-only cursor over a fully buffered byte region.

use bytes::Bytes;

use crate::{ParquetError, Result};

/// Bounds-checked read cursor.
///
/// Every read either succeeds completely or fails with
/// [`ParquetError::BufferUnderflow`] without moving the position.
#[derive(Debug, Clone)]
pub struct ReadCursor {
    data: Bytes,
    pos: usize,
}

impl ReadCursor {
    pub fn new(data: impl Into<Bytes>) -> Self {
        ReadCursor {
            data: data.into(),
            pos: 0,
        }
    }

    /// Current byte offset from the start of the region.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Total length of the underlying region.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    fn check(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(ParquetError::underflow(self.pos, needed, self.remaining()));
        }
        Ok(())
    }

    /// Returns the next byte without advancing.
    pub fn peek_u8(&self) -> Result<u8> {
        self.check(1)?;
        Ok(self.data[self.pos])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek_u8()?;
        self.pos += 1;
        Ok(b)
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_slice(&mut self, n: usize) -> Result<&[u8]> {
        self.check(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..start + n])
    }

    /// Zero-copy slice of the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.check(n)?;
        let out = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.check(n)?;
        self.pos += n;
        Ok(())
    }

    /// Everything from the current position to the end, consuming it.
    pub fn read_to_end(&mut self) -> Bytes {
        let out = self.data.slice(self.pos..);
        self.pos = self.data.len();
        out
    }
}
