//! Subscriber registry keyed by owner.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use journal_engine::{order_entries, EntryQuery, JournalEntry, LiveServerMessage};
use tokio::sync::mpsc;

/// Sender for live messages.
pub type MessageSender = mpsc::UnboundedSender<LiveServerMessage>;

/// A single live subscriber.
#[derive(Debug)]
struct Subscriber {
    owner_id: String,
    /// Ordering the subscriber asked for
    query: EntryQuery,
    sender: MessageSender,
    /// Sequence of the newest snapshot this subscriber was sent
    delivered: u64,
}

/// Tracks live subscribers and fans snapshots out to them.
///
/// Thread-safe and can be shared across handlers via `Arc`.
///
/// Every snapshot read takes a sequence number from
/// [`next_sequence`](Self::next_sequence) before it queries the database.
/// A subscriber only accepts snapshots newer than the last one it was sent,
/// so a slow read can never overwrite a fresher one.
#[derive(Debug, Default)]
pub struct LiveHub {
    /// All subscribers, keyed by connection ID.
    subscribers: DashMap<String, Subscriber>,
    /// Connection IDs per owner.
    by_owner: DashMap<String, Vec<String>>,
    sequence: AtomicU64,
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new hub wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a subscriber and return its connection ID.
    pub fn register(&self, owner_id: &str, query: EntryQuery, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        self.subscribers.insert(
            conn_id.clone(),
            Subscriber {
                owner_id: owner_id.to_string(),
                query,
                sender,
                delivered: 0,
            },
        );
        self.by_owner
            .entry(owner_id.to_string())
            .or_default()
            .push(conn_id.clone());

        tracing::info!(conn_id = %conn_id, owner_id = %owner_id, "live subscriber registered");
        conn_id
    }

    pub fn unregister(&self, conn_id: &str) {
        let Some((_, subscriber)) = self.subscribers.remove(conn_id) else {
            return;
        };

        if let Some(mut conn_ids) = self.by_owner.get_mut(&subscriber.owner_id) {
            conn_ids.retain(|id| id != conn_id);
            if conn_ids.is_empty() {
                drop(conn_ids);
                self.by_owner
                    .remove_if(&subscriber.owner_id, |_, ids| ids.is_empty());
            }
        }

        tracing::info!(conn_id = %conn_id, owner_id = %subscriber.owner_id, "live subscriber unregistered");
    }

    /// Whether anyone is watching `owner_id`'s collection.
    pub fn has_subscribers(&self, owner_id: &str) -> bool {
        self.by_owner.contains_key(owner_id)
    }

    /// Reserve the sequence number for a snapshot read that is about to start.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Push a snapshot read under `sequence` to every subscriber of
    /// `owner_id`, each in its own requested order.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish_snapshot(
        &self,
        owner_id: &str,
        sequence: u64,
        entries: &[JournalEntry],
    ) -> usize {
        self.fan_out(owner_id, sequence, |query| {
            let mut ordered = entries.to_vec();
            order_entries(&mut ordered, query);
            LiveServerMessage::snapshot(ordered)
        })
    }

    /// Report a failed snapshot read to every subscriber of `owner_id`.
    pub fn publish_error(&self, owner_id: &str, sequence: u64, message: &str) -> usize {
        self.fan_out(owner_id, sequence, |_| LiveServerMessage::error(message))
    }

    /// Send the result of a snapshot read to one subscriber.
    ///
    /// Dropped when the subscriber was already sent a newer snapshot.
    pub fn send_snapshot(
        &self,
        conn_id: &str,
        sequence: u64,
        message: LiveServerMessage,
    ) -> bool {
        self.subscribers
            .get_mut(conn_id)
            .is_some_and(|mut s| s.deliver(sequence, message))
    }

    /// Send a message to a specific subscriber.
    pub fn send_to(&self, conn_id: &str, message: LiveServerMessage) -> bool {
        self.subscribers
            .get(conn_id)
            .is_some_and(|s| s.sender.send(message).is_ok())
    }

    pub fn connection_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn owner_count(&self) -> usize {
        self.by_owner.len()
    }

    fn fan_out(
        &self,
        owner_id: &str,
        sequence: u64,
        message: impl Fn(&EntryQuery) -> LiveServerMessage,
    ) -> usize {
        let conn_ids = match self.by_owner.get(owner_id) {
            Some(ids) => ids.value().clone(),
            None => return 0,
        };

        let mut sent = 0;
        for conn_id in &conn_ids {
            if let Some(mut subscriber) = self.subscribers.get_mut(conn_id) {
                let msg = message(&subscriber.query);
                if subscriber.deliver(sequence, msg) {
                    sent += 1;
                }
            }
        }

        tracing::debug!(owner_id = %owner_id, recipients = sent, "published to live subscribers");
        sent
    }
}

impl Subscriber {
    /// Send unless a newer snapshot already went out. Runs under the
    /// subscriber's map entry lock so check and send cannot interleave.
    fn deliver(&mut self, sequence: u64, message: LiveServerMessage) -> bool {
        if sequence <= self.delivered {
            return false;
        }
        self.delivered = sequence;
        self.sender.send(message).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, timestamp: u64) -> JournalEntry {
        JournalEntry::builder(id, "2024-01-01", timestamp).build()
    }

    #[test]
    fn register_unregister() {
        let hub = LiveHub::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let conn_id = hub.register("u1", EntryQuery::newest_first(), tx);
        assert_eq!(hub.connection_count(), 1);
        assert!(hub.has_subscribers("u1"));

        hub.unregister(&conn_id);
        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.owner_count(), 0);
        assert!(!hub.has_subscribers("u1"));

        // Unknown IDs are ignored
        hub.unregister(&conn_id);
    }

    #[test]
    fn publish_reaches_only_owner() {
        let hub = LiveHub::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        hub.register("u1", EntryQuery::newest_first(), tx1);
        hub.register("u2", EntryQuery::newest_first(), tx2);

        let sent = hub.publish_snapshot("u1", hub.next_sequence(), &[entry("a", 1)]);
        assert_eq!(sent, 1);
        assert!(matches!(
            rx1.try_recv().unwrap(),
            LiveServerMessage::Snapshot { entries } if entries.len() == 1
        ));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn snapshot_follows_subscriber_order() {
        let hub = LiveHub::new();
        let (desc_tx, mut desc_rx) = mpsc::unbounded_channel();
        let (asc_tx, mut asc_rx) = mpsc::unbounded_channel();
        hub.register("u1", EntryQuery::newest_first(), desc_tx);
        hub.register("u1", EntryQuery::oldest_first(), asc_tx);

        let seq = hub.next_sequence();
        assert_eq!(hub.publish_snapshot("u1", seq, &[entry("a", 1), entry("b", 2)]), 2);

        let ids = |msg: LiveServerMessage| match msg {
            LiveServerMessage::Snapshot { entries } => {
                entries.into_iter().map(|e| e.id).collect::<Vec<_>>()
            }
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(ids(desc_rx.try_recv().unwrap()), ["b", "a"]);
        assert_eq!(ids(asc_rx.try_recv().unwrap()), ["a", "b"]);
    }

    #[test]
    fn closed_receivers_are_not_counted() {
        let hub = LiveHub::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let conn_id = hub.register("u1", EntryQuery::default(), tx);
        drop(rx);

        assert_eq!(hub.publish_error("u1", hub.next_sequence(), "unavailable"), 0);
        assert!(!hub.send_to(&conn_id, LiveServerMessage::Pong));
    }

    fn snapshot_ids(msg: LiveServerMessage) -> Vec<String> {
        match msg {
            LiveServerMessage::Snapshot { entries } => entries.into_iter().map(|e| e.id).collect(),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn initial_snapshot_older_than_publish_is_dropped() {
        let hub = LiveHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn_id = hub.register("u1", EntryQuery::newest_first(), tx);

        // The initial read starts, then a write commits and publishes first
        let initial = hub.next_sequence();
        let write = hub.next_sequence();
        assert_eq!(hub.publish_snapshot("u1", write, &[entry("a", 1), entry("b", 2)]), 1);

        let stale = LiveServerMessage::snapshot(vec![entry("a", 1)]);
        assert!(!hub.send_snapshot(&conn_id, initial, stale));

        assert_eq!(snapshot_ids(rx.try_recv().unwrap()), ["b", "a"]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn snapshots_in_order_are_all_delivered() {
        let hub = LiveHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn_id = hub.register("u1", EntryQuery::newest_first(), tx);

        let initial = hub.next_sequence();
        assert!(hub.send_snapshot(&conn_id, initial, LiveServerMessage::snapshot(vec![])));
        let write = hub.next_sequence();
        assert_eq!(hub.publish_snapshot("u1", write, &[entry("a", 1)]), 1);

        assert!(snapshot_ids(rx.try_recv().unwrap()).is_empty());
        assert_eq!(snapshot_ids(rx.try_recv().unwrap()), ["a"]);
    }

    #[test]
    fn stale_publish_does_not_follow_newer_one() {
        let hub = LiveHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn_id = hub.register("u1", EntryQuery::newest_first(), tx);

        let first = hub.next_sequence();
        let second = hub.next_sequence();
        assert_eq!(hub.publish_snapshot("u1", second, &[entry("a", 1), entry("b", 2)]), 1);
        assert_eq!(hub.publish_snapshot("u1", first, &[entry("a", 1)]), 0);
        assert_eq!(hub.publish_error("u1", first, "unavailable"), 0);

        // Pongs are not snapshots and always go through
        assert!(hub.send_to(&conn_id, LiveServerMessage::Pong));

        assert_eq!(snapshot_ids(rx.try_recv().unwrap()), ["b", "a"]);
        assert_eq!(rx.try_recv().unwrap(), LiveServerMessage::Pong);
        assert!(rx.try_recv().is_err());
    }
}
