//! Result shapes for one-shot entry operations.
//!
//! The one-shot operations never fail to the caller: every provider fault
//! is folded into `success: false` plus the provider's raw message.

use crate::{EntryId, Error, JournalEntry};
use serde::{Deserialize, Serialize};

/// Message reported when an operation needs an identity and has none.
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Outcome of saving a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn saved(id: impl Into<EntryId>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.to_string()),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::failed(Error::NotAuthenticated)
    }
}

/// Outcome of a full ordered read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    pub success: bool,
    pub entries: Vec<JournalEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn fetched(entries: Vec<JournalEntry>) -> Self {
        Self {
            success: true,
            entries,
            error: None,
        }
    }

    /// A failed read always carries an empty entry list.
    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            entries: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::failed(Error::NotAuthenticated)
    }
}

/// Outcome of an update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteOutcome {
    pub fn done() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::failed(Error::NotAuthenticated)
    }
}
