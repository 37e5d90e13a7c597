//! The Provider - root entry point handing out reporters.

use std::sync::Arc;

use healthwatch_types::{FullModuleId, Identity, StatusSnapshot};

use crate::error::Result;
use crate::reporter::Reporter;
use crate::table::StatusTable;

/// The root of the reporter hierarchy.
///
/// A Provider owns the shared [`StatusTable`] and hands out a top-level
/// [`Reporter`] per module. It holds no health data of its own. Create one
/// per process at startup and pass it (or its reporters) to components.
///
/// # Example
///
/// ```rust
/// use healthwatch_sdk::{Level, Provider};
/// use healthwatch_types::FullModuleId;
///
/// let provider = Provider::builder().max_rows(1024).build();
///
/// let module = FullModuleId::new(["agent", "datapath"]).unwrap();
/// let reporter = provider.for_module(&module);
/// reporter.new_scope("loader").unwrap().ok("ready").unwrap();
///
/// let snapshot = provider.collect();
/// assert_eq!(snapshot.counts().get(Level::Ok), 1);
/// ```
#[derive(Debug)]
pub struct Provider {
    table: Arc<StatusTable>,
}

impl Provider {
    /// Create a provider over an empty, unbounded table.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the provider.
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    /// Get the top-level reporter for a module.
    ///
    /// Reporters for the same module write to the same row.
    pub fn for_module(&self, module: &FullModuleId) -> Reporter {
        Reporter {
            table: self.table.clone(),
            id: Identity::from_module(module),
        }
    }

    /// Get a reporter from a dotted path such as `"agent.datapath.loader"`.
    pub fn for_path(&self, path: &str) -> Result<Reporter> {
        Ok(Reporter {
            table: self.table.clone(),
            id: path.parse()?,
        })
    }

    /// The shared status table, for queries.
    pub fn table(&self) -> &Arc<StatusTable> {
        &self.table
    }

    /// Copy every committed row into a detached [`StatusSnapshot`].
    pub fn collect(&self) -> StatusSnapshot {
        self.table.collect()
    }

    /// Subscribe to table commits. See [`StatusTable::changes`].
    #[cfg(feature = "tokio")]
    pub fn changes(&self) -> tokio::sync::watch::Receiver<u64> {
        self.table.changes()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a Provider.
#[derive(Debug, Default)]
pub struct ProviderBuilder {
    max_rows: Option<usize>,
}

impl ProviderBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of rows the table will hold.
    ///
    /// Reports that would create a row beyond the cap fail with
    /// [`Error::TransactionFailure`](crate::Error::TransactionFailure).
    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Build the provider.
    pub fn build(self) -> Provider {
        let table = match self.max_rows {
            Some(max) => StatusTable::with_max_rows(max),
            None => StatusTable::new(),
        };
        Provider {
            table: Arc::new(table),
        }
    }
}
