//! Provider error type.
//!
//! The `Display` output of every variant is the provider's raw message,
//! since that string is what surfaces in snapshots and operation outcomes.

/// Failure reported by a collection or settings provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Backend(String),

    #[error("subscription closed")]
    Closed,
}

impl ProviderError {
    pub fn backend(message: impl Into<String>) -> Self {
        ProviderError::Backend(message.into())
    }
}

impl From<ProviderError> for journal_engine::Error {
    fn from(err: ProviderError) -> Self {
        journal_engine::Error::Operation(err.to_string())
    }
}

/// Result type for provider calls.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_message() {
        let err = ProviderError::Rejected {
            status: 403,
            message: "permission-denied".into(),
        };
        assert_eq!(err.to_string(), "permission-denied");
        assert_eq!(ProviderError::backend("quota").to_string(), "quota");
        assert_eq!(ProviderError::Closed.to_string(), "subscription closed");
    }

    #[test]
    fn converts_to_operation_error() {
        let err = journal_engine::Error::from(ProviderError::backend("quota"));
        assert_eq!(err, journal_engine::Error::Operation("quota".into()));
        assert_eq!(err.to_string(), "quota");
    }
}
