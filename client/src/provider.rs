//! Provider seam.
//!
//! A provider owns the storage backend: it opens live subscriptions over
//! an owner's entry collection and performs one-shot reads and writes.
//! [`MemoryProvider`](crate::MemoryProvider) and
//! [`HttpProvider`](crate::HttpProvider) are the two implementations.

use crate::error::Result;
use futures::future::BoxFuture;
use journal_engine::{
    EntryId, EntryPatch, EntryQuery, Generation, JournalEntry, NewEntry, StoredTimeSettings,
    Timestamp,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One delivery from a live subscription: the full ordered result set or
/// the provider's error message.
pub type Delivery = std::result::Result<Vec<JournalEntry>, String>;

/// Where a subscription sends its deliveries.
///
/// Every delivery is tagged with the generation the subscription was
/// opened under, so the receiving store can drop late ones.
#[derive(Debug, Clone)]
pub struct DeliverySink {
    generation: Generation,
    tx: mpsc::UnboundedSender<(Generation, Delivery)>,
}

impl DeliverySink {
    pub fn new(generation: Generation, tx: mpsc::UnboundedSender<(Generation, Delivery)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Push a full result set. Returns `false` once the receiver is gone.
    pub fn deliver(&self, entries: Vec<JournalEntry>) -> bool {
        self.tx.send((self.generation, Ok(entries))).is_ok()
    }

    pub fn fail(&self, error: impl ToString) -> bool {
        self.tx.send((self.generation, Err(error.to_string()))).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Handle to an open live subscription. Dropping it closes the subscription.
pub struct Subscription {
    close: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            close: Some(Box::new(close)),
        }
    }

    /// A subscription backed by a task; closing it aborts the task.
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self::new(move || task.abort())
    }

    /// Close the subscription. Further calls do nothing.
    pub fn close(&mut self) {
        if let Some(close) = self.close.take() {
            close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Storage for owner-scoped entry collections.
pub trait CollectionProvider: Send + Sync + 'static {
    /// Open a live ordered subscription over `owner`'s collection.
    ///
    /// The provider delivers the current result set promptly and again
    /// after every change, until the returned handle is closed.
    fn open_subscription(&self, owner: &str, query: EntryQuery, sink: DeliverySink)
        -> Subscription;

    /// Create an entry and return its generated ID.
    fn create(
        &self,
        owner: &str,
        entry: NewEntry,
        timestamp: Timestamp,
    ) -> BoxFuture<'_, Result<EntryId>>;

    /// Read the whole collection once, ordered by `query`.
    fn read(&self, owner: &str, query: EntryQuery) -> BoxFuture<'_, Result<Vec<JournalEntry>>>;

    /// Write the patch's fields. Fails if the entry does not exist.
    fn update(&self, owner: &str, id: &str, patch: EntryPatch) -> BoxFuture<'_, Result<()>>;

    /// Delete an entry. Deleting a missing entry succeeds.
    fn delete(&self, owner: &str, id: &str) -> BoxFuture<'_, Result<()>>;
}

/// Storage for the per-owner time settings document.
pub trait SettingsProvider: Send + Sync + 'static {
    /// `None` when the owner has never saved settings.
    fn load_settings(&self, owner: &str) -> BoxFuture<'_, Result<Option<StoredTimeSettings>>>;

    /// Merge `settings` into the stored document.
    fn save_settings(&self, owner: &str, settings: StoredTimeSettings)
        -> BoxFuture<'_, Result<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn subscription_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        let mut sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.close();
        sub.close();
        drop(sub);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_closes() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        drop(Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sink_tags_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = DeliverySink::new(7, tx);
        assert!(sink.deliver(Vec::new()));
        assert!(sink.fail("denied"));

        assert_eq!(rx.try_recv().unwrap(), (7, Ok(Vec::new())));
        assert_eq!(rx.try_recv().unwrap(), (7, Err("denied".to_string())));

        drop(rx);
        assert!(sink.is_closed());
        assert!(!sink.deliver(Vec::new()));
    }
}
