//! # vvtv Storage
//!
//! Append-only log backends for the vvtv control plane.
//!
//! Backends are **opaque byte logs**. They do not know about snapshot
//! kinds, keys or record framing; the snapshot store owns all of that.
//!
//! ## Design Principles
//!
//! - Backends only read, append, flush and rewrite bytes
//! - Must be `Send + Sync` so a store can be shared across request tasks
//! - A persistent log is owned by exactly one process at a time
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and ephemeral deployments
//! - [`FileBackend`] - Persistent log file guarded by an advisory lock
//!
//! ## Example
//!
//! ```rust
//! use vvtv_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"record").unwrap();
//! assert_eq!(offset, 0);
//! assert_eq!(backend.read_all().unwrap(), b"record");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
