//! One-shot entry operations.
//!
//! Each call resolves the current identity first. Without one it returns
//! the `Not authenticated` outcome and never reaches the provider.
//! Provider failures are logged and folded into the outcome.

use crate::identity::IdentitySignal;
use crate::provider::CollectionProvider;
use journal_engine::{
    EntryPatch, EntryQuery, Error, FetchOutcome, NewEntry, SaveOutcome, Timestamp, WriteOutcome,
};
use std::sync::Arc;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}

pub struct JournalQueries<P> {
    provider: Arc<P>,
    identity: IdentitySignal,
}

impl<P> Clone for JournalQueries<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<P: CollectionProvider> JournalQueries<P> {
    pub fn new(provider: Arc<P>, identity: IdentitySignal) -> Self {
        Self { provider, identity }
    }

    /// Create an entry stamped with the current time.
    pub async fn save(&self, entry: NewEntry) -> SaveOutcome {
        self.save_at(entry, now_millis()).await
    }

    /// Create an entry with an explicit creation timestamp.
    pub async fn save_at(&self, entry: NewEntry, timestamp: Timestamp) -> SaveOutcome {
        let Some(owner) = self.identity.owner() else {
            return SaveOutcome::not_authenticated();
        };

        match self.provider.create(&owner, entry, timestamp).await {
            Ok(id) => {
                tracing::debug!(owner = %owner, id = %id, "journal entry saved");
                SaveOutcome::saved(id)
            }
            Err(e) => {
                tracing::error!(owner = %owner, error = %e, "error saving journal entry");
                SaveOutcome::failed(Error::from(e))
            }
        }
    }

    /// Read every entry, newest first.
    pub async fn fetch_all(&self) -> FetchOutcome {
        let Some(owner) = self.identity.owner() else {
            return FetchOutcome::not_authenticated();
        };

        match self.provider.read(&owner, EntryQuery::newest_first()).await {
            Ok(entries) => FetchOutcome::fetched(entries),
            Err(e) => {
                tracing::error!(owner = %owner, error = %e, "error fetching journal entries");
                FetchOutcome::failed(Error::from(e))
            }
        }
    }

    pub async fn update(&self, id: &str, patch: EntryPatch) -> WriteOutcome {
        let Some(owner) = self.identity.owner() else {
            return WriteOutcome::not_authenticated();
        };

        match self.provider.update(&owner, id, patch).await {
            Ok(()) => WriteOutcome::done(),
            Err(e) => {
                tracing::error!(owner = %owner, id, error = %e, "error updating journal entry");
                WriteOutcome::failed(Error::from(e))
            }
        }
    }

    pub async fn delete(&self, id: &str) -> WriteOutcome {
        let Some(owner) = self.identity.owner() else {
            return WriteOutcome::not_authenticated();
        };

        match self.provider.delete(&owner, id).await {
            Ok(()) => WriteOutcome::done(),
            Err(e) => {
                tracing::error!(owner = %owner, id, error = %e, "error deleting journal entry");
                WriteOutcome::failed(Error::from(e))
            }
        }
    }
}
