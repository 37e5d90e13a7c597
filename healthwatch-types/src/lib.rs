//! # healthwatch-types
//!
//! Core types for hierarchical health reporting. This crate defines the
//! schema shared by reporters writing health and tools reading it back:
//! how a component is named, which levels it can be in, and what a single
//! status row records.
//!
//! ## Design Goals
//!
//! - **Plain data**: Every type is `Clone + PartialEq` and carries no handles
//! - **Stable keys**: An [`Identity`] has exactly one canonical string form
//! - **Optional serialization**: Enable the `serde` feature as needed
//! - **Versioned schema**: Snapshots record the schema they were written with
//!
//! ## Example
//!
//! ```rust
//! use healthwatch_types::{FullModuleId, Identity, Level, Status};
//!
//! let module = FullModuleId::new(["agent", "datapath"]).unwrap();
//! let id = Identity::from_module(&module).child("loader").unwrap();
//! assert_eq!(id.to_string(), "agent.datapath.loader");
//!
//! let status = Status::new(id, Level::Ok, "loaded", 1_703_160_000_000);
//! assert_eq!(status.count, 1);
//! assert!(!status.is_stopped());
//! ```
//!
//! ## Schema Version
//!
//! Serialized snapshots carry a `schema` field, currently **1**.

mod identity;
mod level;
mod snapshot;
mod status;

pub use identity::*;
pub use level::*;
pub use snapshot::*;
pub use status::*;

/// Current schema version.
///
/// Bumped whenever a [`StatusSnapshot`] field changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// Get current timestamp in milliseconds since Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
