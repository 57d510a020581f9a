//! Client configuration loaded from environment variables.

use std::env;

/// Default server address when `JOURNAL_SERVER_URL` is unset.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the journal server
    pub server_url: String,
    /// Bearer token presented to the server
    pub token: Option<String>,
    /// Identity to sign in as
    pub owner: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url = env::var("JOURNAL_SERVER_URL")
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        let server_url = normalize_url(&server_url)?;

        let token = env::var("JOURNAL_TOKEN").ok().filter(|t| !t.is_empty());
        let owner = env::var("JOURNAL_OWNER").ok().filter(|o| !o.is_empty());

        Ok(Self {
            server_url,
            token,
            owner,
        })
    }

    /// The configured owner, or an error if none is set.
    pub fn require_owner(&self) -> Result<&str, ConfigError> {
        self.owner.as_deref().ok_or(ConfigError::MissingOwner)
    }
}

fn normalize_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidServerUrl(raw.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JOURNAL_OWNER environment variable is required")]
    MissingOwner,

    #[error("Invalid JOURNAL_SERVER_URL value: {0}")]
    InvalidServerUrl(String),
}
