//! Fault injection for storage tests.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vvtv_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};

/// Switch shared between a test and its [`FaultyBackend`].
#[derive(Debug, Clone, Default)]
pub struct FaultSwitch(Arc<AtomicBool>);

impl FaultSwitch {
    /// Makes every following write fail.
    pub fn fail_writes(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Lets writes succeed again.
    pub fn heal(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    fn is_failing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory backend whose writes can be made to fail on demand.
///
/// Reads always succeed so a store can be opened and queried while its
/// writes are broken.
#[derive(Debug, Default)]
pub struct FaultyBackend {
    inner: InMemoryBackend,
    switch: FaultSwitch,
}

impl FaultyBackend {
    /// Creates an empty backend and the switch that controls it.
    pub fn new() -> (Self, FaultSwitch) {
        let switch = FaultSwitch::default();
        let backend = Self {
            inner: InMemoryBackend::new(),
            switch: switch.clone(),
        };
        (backend, switch)
    }

    fn check(&self) -> StorageResult<()> {
        if self.switch.is_failing() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected write failure",
            )));
        }
        Ok(())
    }
}

impl StorageBackend for FaultyBackend {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        self.inner.read_all()
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        self.check()?;
        self.inner.append(data)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.check()?;
        self.inner.flush()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.check()?;
        self.inner.sync()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.inner.truncate(new_size)
    }

    fn rewrite(&mut self, data: &[u8]) -> StorageResult<()> {
        self.check()?;
        self.inner.rewrite(data)
    }
}
