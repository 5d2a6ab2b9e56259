//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up snapshot stores
//! and the shared test credential.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vvtv_auth::ControlCredential;
use vvtv_snapshot::{SnapshotStore, StoreOptions};

/// Bearer token used by test servers.
pub const TEST_TOKEN: &str = "test-token";
/// Signing secret used by test servers.
pub const TEST_SECRET: &[u8] = b"test-secret";

/// Returns the credential every test server and request builder shares.
pub fn test_credential() -> ControlCredential {
    ControlCredential::new(TEST_TOKEN, TEST_SECRET.to_vec())
}

/// A test snapshot store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: SnapshotStore,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: SnapshotStore::open_in_memory().expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store in a fresh temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SnapshotStore::open_dir(temp_dir.path(), StoreOptions::default())
            .expect("Failed to open file store");

        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the data directory if file-backed, None if in-memory.
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Returns the log file path if file-backed.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.dir().map(|d| d.join(vvtv_snapshot::LOG_FILE_NAME))
    }

    /// Closes the store and reopens it from the same directory.
    ///
    /// Panics for in-memory stores, which have nothing to reopen.
    pub fn reopen(self) -> Self {
        let Self { store, temp_dir } = self;
        let temp_dir = temp_dir.expect("Only file stores can be reopened");
        drop(store);

        let store = SnapshotStore::open_dir(temp_dir.path(), StoreOptions::default())
            .expect("Failed to reopen file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Consumes the fixture, returning the store and its directory guard.
    pub fn into_parts(self) -> (SnapshotStore, Option<TempDir>) {
        (self.store, self.temp_dir)
    }
}

impl std::ops::Deref for TestStore {
    type Target = SnapshotStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use vvtv_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     assert!(store.get_status().is_none());
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&SnapshotStore) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary file-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&SnapshotStore, &Path) -> R,
{
    let test_store = TestStore::file();
    let dir = test_store.dir().expect("File store should have a directory");
    f(&test_store.store, dir)
}

/// Builds a daily report payload for `date`.
pub fn daily_payload(date: &str, plays: u64) -> Vec<u8> {
    format!(r#"{{"date":"{date}","plays":{plays},"errors":0}}"#).into_bytes()
}

/// Builds a weekly report payload for `week`.
pub fn weekly_payload(week: &str, plays: u64) -> Vec<u8> {
    format!(r#"{{"week":"{week}","plays":{plays},"top":["a","b"]}}"#).into_bytes()
}

/// Builds a status payload.
pub fn status_payload(state: &str, buffer_minutes: u32) -> Vec<u8> {
    format!(r#"{{"state":"{state}","buffer_minutes":{buffer_minutes}}}"#).into_bytes()
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a store holding a status and `days` consecutive daily
    /// reports for January 2024, plus one weekly report.
    pub fn populated_store(days: u32) -> TestStore {
        let test_store = TestStore::memory();
        test_store
            .upsert_status(&status_payload("RUNNING", 45))
            .expect("Failed to upsert status");

        for day in 1..=days.min(31) {
            let date = format!("2024-01-{day:02}");
            test_store
                .upsert_daily(&date, &daily_payload(&date, u64::from(day)))
                .expect("Failed to upsert daily");
        }

        test_store
            .upsert_weekly("2024-W01", &weekly_payload("2024-W01", 7))
            .expect("Failed to upsert weekly");

        test_store
    }
}
