//! In-memory log backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// An in-memory log.
///
/// Suitable for tests and for running the control plane without a data
/// directory, in which case every snapshot is lost on restart.
///
/// # Example
///
/// ```rust
/// use vvtv_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.append(b"abc").unwrap();
/// assert_eq!(backend.size().unwrap(), 3);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: Vec<u8>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory log with pre-existing bytes.
    ///
    /// Useful for exercising recovery from torn or corrupt logs.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let size = self.data.len() as u64;
        if new_size > size {
            return Err(StorageError::InvalidTruncate {
                requested: new_size,
                size,
            });
        }
        self.data.truncate(new_size as usize);
        Ok(())
    }

    fn rewrite(&mut self, data: &[u8]) -> StorageResult<()> {
        self.data = data.to_vec();
        Ok(())
    }
}
