//! Error types for the journal engine.

use thiserror::Error;

/// All possible errors from the journal engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation that needs an identity was invoked without one.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The live subscription reported a fault.
    #[error("{0}")]
    Subscription(String),

    /// A one-shot read or write failed at the provider.
    #[error("{0}")]
    Operation(String),

    #[error("invalid unlock time '{0}': expected HH:MM")]
    InvalidUnlockTime(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
