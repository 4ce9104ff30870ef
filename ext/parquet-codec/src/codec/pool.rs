//! Reusable value buffers.
//!
//! Decoding a page needs a scratch buffer of present values that is thrown
//! away once the page is unpacked. Pools keep those buffers around between
//! pages. A rented buffer is a [`PooledArray`] guard that goes back to its
//! pool when dropped, so every exit path returns it.

use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

use super::array::{ArrayStorage, TypedArray};
use crate::options::DEFAULT_POOL_RETENTION;
use crate::{ParquetError, Result};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

struct PoolInner<T> {
    id: u64,
    free: Mutex<Vec<Vec<T>>>,
    retention: usize,
    outstanding: AtomicUsize,
}

/// A pool of `Vec<T>` buffers shared by every codec producing `T`.
///
/// Cloning yields another handle to the same pool.
pub struct ArrayPool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for ArrayPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ArrayPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayPool")
            .field("id", &self.inner.id)
            .field("retention", &self.inner.retention)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

impl<T> Default for ArrayPool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_RETENTION)
    }
}

impl<T> ArrayPool<T> {
    /// Create a pool that keeps at most `retention` idle buffers.
    pub fn new(retention: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
                free: Mutex::new(Vec::new()),
                retention,
                outstanding: AtomicUsize::new(0),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Buffers rented and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    /// Idle buffers ready for reuse.
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Returns a pooled array to this pool.
    ///
    /// Owned arrays and arrays rented from another pool are rejected; the
    /// latter still go back to the pool they came from.
    pub fn release(&self, array: TypedArray<T>) -> Result<()> {
        match array.into_storage() {
            ArrayStorage::Owned(_) => Err(ParquetError::pool_misuse(format!(
                "array was not rented from pool {}",
                self.inner.id
            ))),
            ArrayStorage::Pooled(pooled) if pooled.pool_id() != self.inner.id => {
                Err(ParquetError::pool_misuse(format!(
                    "array rented from pool {} released to pool {}",
                    pooled.pool_id(),
                    self.inner.id
                )))
            }
            ArrayStorage::Pooled(pooled) => {
                pooled.release();
                Ok(())
            }
        }
    }
}

impl<T: Clone> ArrayPool<T> {
    /// Rents a buffer of exactly `min_count` elements, each set to `filler`.
    pub fn rent(&self, min_count: usize, filler: &T) -> PooledArray<T> {
        let reused = {
            let mut free = self.inner.free.lock();
            match free.iter().position(|b| b.capacity() >= min_count) {
                Some(idx) => Some(free.swap_remove(idx)),
                None => free.pop(),
            }
        };
        let mut data = match reused {
            Some(buf) => buf,
            None => {
                trace!(pool = self.inner.id, min_count, "allocating pooled buffer");
                Vec::with_capacity(min_count)
            }
        };
        data.resize(min_count, filler.clone());
        self.inner.outstanding.fetch_add(1, Ordering::AcqRel);

        PooledArray {
            data,
            pool: Arc::clone(&self.inner),
        }
    }
}

/// A rented buffer that returns to its pool when dropped.
pub struct PooledArray<T> {
    data: Vec<T>,
    pool: Arc<PoolInner<T>>,
}

impl<T> PooledArray<T> {
    pub fn pool_id(&self) -> u64 {
        self.pool.id
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns the buffer now instead of at end of scope.
    pub fn release(self) {
        drop(self)
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledArray")
            .field("pool", &self.pool.id)
            .field("data", &self.data)
            .finish()
    }
}

impl<T> Deref for PooledArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for PooledArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> Drop for PooledArray<T> {
    fn drop(&mut self) {
        let mut data = std::mem::take(&mut self.data);
        // Values must not outlive the rental, even while the buffer idles.
        data.clear();
        {
            let mut free = self.pool.free.lock();
            if free.len() < self.pool.retention {
                free.push(data);
            } else {
                trace!(pool = self.pool.id, "pool full, dropping returned buffer");
            }
        }
        self.pool.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rent_and_drop_returns() {
        let pool: ArrayPool<i32> = ArrayPool::new(4);
        {
            let mut buf = pool.rent(10, &0);
            assert_eq!(buf.len(), 10);
            buf[3] = 7;
            assert_eq!(pool.outstanding(), 1);
        }
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.available(), 1);

        let buf = pool.rent(5, &-1);
        assert_eq!(buf.as_slice(), &[-1; 5]);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_retention_limit() {
        let pool: ArrayPool<u8> = ArrayPool::new(1);
        let a = pool.rent(1, &0);
        let b = pool.rent(1, &0);
        drop(a);
        drop(b);
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_release_rejects_owned() {
        let pool: ArrayPool<i64> = ArrayPool::default();
        let err = pool.release(TypedArray::from_vec(vec![1, 2])).unwrap_err();
        assert!(matches!(err, ParquetError::PoolMisuse(_)));
    }

    #[test]
    fn test_release_rejects_foreign_pool() {
        let a: ArrayPool<i64> = ArrayPool::default();
        let b: ArrayPool<i64> = ArrayPool::default();
        let array = TypedArray::from_pooled(a.rent(3, &0));
        assert!(matches!(b.release(array), Err(ParquetError::PoolMisuse(_))));
        // The rejected buffer still went home.
        assert_eq!(a.outstanding(), 0);
        assert_eq!(a.available(), 1);
    }

    #[test]
    fn test_release_to_owner() {
        let pool: ArrayPool<bool> = ArrayPool::default();
        let array = TypedArray::from_pooled(pool.rent(8, &false));
        assert_eq!(pool.outstanding(), 1);
        pool.release(array).unwrap();
        assert_eq!(pool.outstanding(), 0);
    }
}
