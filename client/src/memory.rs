//! In-process provider.
//!
//! Holds every owner's collection in memory and pushes a fresh snapshot to
//! the owner's subscribers after each write. Used by tests and by
//! embedders that do not need persistence. Fault injection hooks let
//! callers exercise the error paths.

use crate::error::{ProviderError, Result};
use crate::lock;
use crate::provider::{CollectionProvider, DeliverySink, SettingsProvider, Subscription};
use futures::future::{self, BoxFuture, FutureExt};
use journal_engine::{
    document_path, order_entries, EntryId, EntryPatch, EntryQuery, JournalEntry, NewEntry,
    OwnerId, StoredTimeSettings, Timestamp,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

struct Subscriber {
    owner: OwnerId,
    query: EntryQuery,
    sink: DeliverySink,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<OwnerId, HashMap<EntryId, JournalEntry>>,
    settings: HashMap<OwnerId, StoredTimeSettings>,
    subscribers: HashMap<u64, Subscriber>,
    next_subscriber: u64,
    subscriptions_opened: usize,
    fail_next: Option<String>,
    failing_subscriptions: HashMap<OwnerId, String>,
}

impl Inner {
    fn snapshot(&self, owner: &str, query: &EntryQuery) -> Vec<JournalEntry> {
        let mut entries: Vec<JournalEntry> = self
            .collections
            .get(owner)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        order_entries(&mut entries, query);
        entries
    }

    fn check_fault(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(message) => Err(ProviderError::Backend(message)),
            None => Ok(()),
        }
    }

    fn notify(&self, owner: &str) {
        for subscriber in self.subscribers.values().filter(|s| s.owner == owner) {
            subscriber.sink.deliver(self.snapshot(owner, &subscriber.query));
        }
    }
}

/// Provider that keeps all data in memory.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next one-shot operation fail with `message`.
    pub fn fail_next_operation(&self, message: impl Into<String>) {
        lock(&self.inner).fail_next = Some(message.into());
    }

    /// Fault every subscription on `owner`'s collection with `message`.
    ///
    /// Open subscribers receive the error immediately; new ones receive it
    /// instead of a snapshot until [`clear_subscription_fault`](Self::clear_subscription_fault).
    pub fn fail_subscriptions(&self, owner: &str, message: impl Into<String>) {
        let message = message.into();
        let mut inner = lock(&self.inner);
        for subscriber in inner.subscribers.values().filter(|s| s.owner == owner) {
            subscriber.sink.fail(&message);
        }
        inner.failing_subscriptions.insert(owner.to_string(), message);
    }

    pub fn clear_subscription_fault(&self, owner: &str) {
        lock(&self.inner).failing_subscriptions.remove(owner);
    }

    /// Insert or replace an entry directly, notifying subscribers.
    pub fn insert(&self, owner: &str, entry: JournalEntry) {
        let mut inner = lock(&self.inner);
        inner
            .collections
            .entry(owner.to_string())
            .or_default()
            .insert(entry.id.clone(), entry);
        inner.notify(owner);
    }

    /// Current entries of `owner`, newest first.
    pub fn entries(&self, owner: &str) -> Vec<JournalEntry> {
        lock(&self.inner).snapshot(owner, &EntryQuery::newest_first())
    }

    pub fn stored_settings(&self, owner: &str) -> Option<StoredTimeSettings> {
        lock(&self.inner).settings.get(owner).cloned()
    }

    /// Number of subscriptions ever opened.
    pub fn subscriptions_opened(&self) -> usize {
        lock(&self.inner).subscriptions_opened
    }

    /// Number of subscriptions currently open.
    pub fn active_subscriptions(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    fn create_now(&self, owner: &str, entry: NewEntry, timestamp: Timestamp) -> Result<EntryId> {
        let mut inner = lock(&self.inner);
        inner.check_fault()?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        inner
            .collections
            .entry(owner.to_string())
            .or_default()
            .insert(id.clone(), entry.into_entry(id.clone(), timestamp));
        inner.notify(owner);
        Ok(id)
    }

    fn read_now(&self, owner: &str, query: EntryQuery) -> Result<Vec<JournalEntry>> {
        let mut inner = lock(&self.inner);
        inner.check_fault()?;
        Ok(inner.snapshot(owner, &query))
    }

    fn update_now(&self, owner: &str, id: &str, patch: EntryPatch) -> Result<()> {
        let mut inner = lock(&self.inner);
        inner.check_fault()?;

        let entry = inner
            .collections
            .get_mut(owner)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| {
                ProviderError::Backend(format!(
                    "No document to update: {}",
                    document_path(owner, id)
                ))
            })?;
        entry.apply_patch(&patch);
        inner.notify(owner);
        Ok(())
    }

    fn delete_now(&self, owner: &str, id: &str) -> Result<()> {
        let mut inner = lock(&self.inner);
        inner.check_fault()?;

        let removed = inner
            .collections
            .get_mut(owner)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            inner.notify(owner);
        }
        Ok(())
    }
}

impl CollectionProvider for MemoryProvider {
    fn open_subscription(
        &self,
        owner: &str,
        query: EntryQuery,
        sink: DeliverySink,
    ) -> Subscription {
        let mut inner = lock(&self.inner);
        let key = inner.next_subscriber;
        inner.next_subscriber += 1;
        inner.subscriptions_opened += 1;

        match inner.failing_subscriptions.get(owner) {
            Some(message) => sink.fail(message),
            None => sink.deliver(inner.snapshot(owner, &query)),
        };
        inner.subscribers.insert(
            key,
            Subscriber {
                owner: owner.to_string(),
                query,
                sink,
            },
        );
        tracing::debug!(owner, subscriber = key, "memory subscription opened");

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).subscribers.remove(&key);
            }
        })
    }

    fn create(
        &self,
        owner: &str,
        entry: NewEntry,
        timestamp: Timestamp,
    ) -> BoxFuture<'_, Result<EntryId>> {
        future::ready(self.create_now(owner, entry, timestamp)).boxed()
    }

    fn read(&self, owner: &str, query: EntryQuery) -> BoxFuture<'_, Result<Vec<JournalEntry>>> {
        future::ready(self.read_now(owner, query)).boxed()
    }

    fn update(&self, owner: &str, id: &str, patch: EntryPatch) -> BoxFuture<'_, Result<()>> {
        future::ready(self.update_now(owner, id, patch)).boxed()
    }

    fn delete(&self, owner: &str, id: &str) -> BoxFuture<'_, Result<()>> {
        future::ready(self.delete_now(owner, id)).boxed()
    }
}

impl SettingsProvider for MemoryProvider {
    fn load_settings(&self, owner: &str) -> BoxFuture<'_, Result<Option<StoredTimeSettings>>> {
        let result = {
            let mut inner = lock(&self.inner);
            inner
                .check_fault()
                .map(|()| inner.settings.get(owner).cloned())
        };
        future::ready(result).boxed()
    }

    fn save_settings(
        &self,
        owner: &str,
        settings: StoredTimeSettings,
    ) -> BoxFuture<'_, Result<()>> {
        let result = {
            let mut inner = lock(&self.inner);
            inner.check_fault().map(|()| {
                inner
                    .settings
                    .entry(owner.to_string())
                    .or_default()
                    .merge(settings);
            })
        };
        future::ready(result).boxed()
    }
}
