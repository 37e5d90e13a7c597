//! # healthwatch-sdk
//!
//! Hierarchical health reporting for long-running processes.
//!
//! Components report whether they are OK, degraded or stopped through a
//! [`Reporter`]. Every report lands in a single [`StatusTable`] that keeps
//! the latest status per component and an index by level, so monitoring
//! code can ask "what is everything doing?" and "what is degraded right
//! now?" without talking to the components.
//!
//! ## Quick Start
//!
//! ```rust
//! use healthwatch_sdk::Provider;
//! use healthwatch_types::{FullModuleId, Level};
//!
//! // One provider per process, created at startup
//! let provider = Provider::new();
//!
//! // Hand each module its reporter, and let it derive scopes
//! let module = FullModuleId::new(["agent", "datapath"]).unwrap();
//! let reporter = provider.for_module(&module);
//! let loader = reporter.new_scope("loader").unwrap();
//!
//! loader.ok("programs loaded").unwrap();
//! reporter.new_scope("sync").unwrap().degraded("retrying", "timeout").unwrap();
//!
//! // Query a consistent snapshot
//! let table = provider.table();
//! let txn = table.read_txn();
//! let degraded: Vec<_> = table.by_level(&txn, Level::Degraded).unwrap().collect();
//! assert_eq!(degraded.len(), 1);
//! assert_eq!(degraded[0].id.as_str(), "agent.datapath.sync");
//! ```
//!
//! ## Features
//!
//! - **Snapshot isolation**: Readers see a fixed view; writers never block them
//! - **Level index**: "All degraded components" without a full scan
//! - **Hierarchical identities**: Modules and nested scopes, dot-joined
//! - **Change notification**: Await the next commit instead of polling
//! - **Thread-safe**: Report from any thread or async task

mod error;
mod provider;
mod reporter;
mod table;

pub use error::{Error, Result};
pub use provider::{Provider, ProviderBuilder};
pub use reporter::Reporter;
pub use table::{ReadTxn, StatusIter, StatusTable, WriteTxn};

// Re-export types for convenience
pub use healthwatch_types::{
    FullModuleId, Identity, IdentityError, Level, LevelCounts, Status, StatusSnapshot,
};
