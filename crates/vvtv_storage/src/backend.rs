//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level append-only log.
///
/// Backends are **opaque byte logs**: the snapshot store frames its own
/// records and replays them on open. Backends never interpret the bytes.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_all` returns every byte appended since the last `rewrite`/`truncate`
/// - `sync` makes all appended data durable
/// - `rewrite` replaces the whole log atomically: a crash leaves either the
///   old contents or the new contents, never a mix
pub trait StorageBackend: Send + Sync {
    /// Reads the entire log.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_all(&self) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the log.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the current log size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Drops every byte after `new_size`.
    ///
    /// Used to cut off a torn record left by a crash mid-append.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is greater than the current size or
    /// the truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Atomically replaces the whole log with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the replacement cannot be written or installed.
    fn rewrite(&mut self, data: &[u8]) -> StorageResult<()>;
}
