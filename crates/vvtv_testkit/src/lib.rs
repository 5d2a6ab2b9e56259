//! # vvtv Testkit
//!
//! Test utilities for the vvtv control plane.
//!
//! This crate provides:
//! - Snapshot store fixtures (in memory or in a temporary directory)
//! - A storage backend with switchable write failures
//! - Signed ingest request builders for driving the HTTP router
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use vvtv_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     store.upsert_daily("2024-01-01", &daily_payload("2024-01-01", 3)).unwrap();
//!     assert_eq!(store.keys(vvtv_snapshot::SnapshotKind::Daily).len(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod requests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::requests::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use requests::*;
