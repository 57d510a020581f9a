//! Live subscription message protocol.
//!
//! All messages are JSON-encoded, tagged by `type`, and use snake_case
//! tags. Entry payloads keep their camelCase document field names.

use crate::JournalEntry;
use serde::{Deserialize, Serialize};

/// Messages sent from a subscriber to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveClientMessage {
    /// Keep-alive ping.
    Ping,
}

/// Messages pushed from the server to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveServerMessage {
    /// The full ordered result set. Replaces whatever the subscriber held.
    Snapshot {
        entries: Vec<JournalEntry>,
    },

    /// The subscription faulted; the subscriber keeps its last snapshot.
    Error {
        message: String,
    },

    /// Response to ping.
    Pong,
}

impl LiveServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>) -> Self {
        LiveServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn snapshot(entries: Vec<JournalEntry>) -> Self {
        LiveServerMessage::Snapshot { entries }
    }
}
