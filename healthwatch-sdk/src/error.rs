//! Error types for health reporting.

use healthwatch_types::IdentityError;
use thiserror::Error;

/// Errors surfaced by the status table, reporters and provider.
///
/// Nothing here is retried internally; every failure is returned to the
/// immediate caller.
#[derive(Debug, Error)]
pub enum Error {
    /// An identity could not be built from the given segments.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    /// A write transaction could not be applied or committed.
    ///
    /// The previously committed rows remain visible.
    #[error("Transaction failed: {0}")]
    TransactionFailure(String),

    /// A read transaction or index lookup failed.
    #[error("Query failed: {0}")]
    QueryFailure(String),
}

impl Error {
    pub(crate) fn transaction(message: impl Into<String>) -> Self {
        Error::TransactionFailure(message.into())
    }

    pub(crate) fn query(message: impl Into<String>) -> Self {
        Error::QueryFailure(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
