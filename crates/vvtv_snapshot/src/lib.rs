//! # vvtv Snapshot Store
//!
//! Keyed insert-or-replace storage for the three record kinds the control
//! plane serves:
//!
//! - `status`: a singleton
//! - `daily`: one record per `date`
//! - `weekly`: one record per `week`
//!
//! Payloads are stored as the exact text received. The only parsing done
//! is the minimum needed to check the payload is a JSON object and to
//! pull out the `date`/`week` key, so a stored payload is never
//! reformatted.
//!
//! # Persistence
//!
//! Every upsert appends one checksummed record to a
//! [`StorageBackend`](vvtv_storage::StorageBackend) log. On open the log
//! is replayed into an in-memory index, later records replacing earlier
//! ones. A torn final record from a crash mid-append is cut off; damage
//! anywhere else refuses to open.
//!
//! ```rust
//! use vvtv_snapshot::SnapshotStore;
//!
//! let store = SnapshotStore::open_in_memory().unwrap();
//! store.upsert_daily("2024-01-01", br#"{"date":"2024-01-01","v":1}"#).unwrap();
//! store.upsert_daily("2024-01-01", br#"{"date":"2024-01-01","v":2}"#).unwrap();
//!
//! let snapshot = store.get_daily("2024-01-01").unwrap();
//! assert_eq!(snapshot.payload, r#"{"date":"2024-01-01","v":2}"#);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod kind;
mod payload;
mod record;
mod store;

pub use error::{SnapshotError, SnapshotResult};
pub use kind::{SnapshotKey, SnapshotKind};
pub use payload::extract_key;
pub use store::{
    CompactStats, Snapshot, SnapshotStore, StoreOptions, StoreStats, DEFAULT_STATUS_PAYLOAD,
    LOG_FILE_NAME,
};
