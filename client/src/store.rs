//! The live journal store.
//!
//! [`JournalStore`] runs a [`JournalSync`] machine on a background task. The
//! task listens to the identity signal and to subscription deliveries,
//! feeds both into the machine, carries out the resulting effects and
//! publishes every new [`SyncState`] on a watch channel.

use crate::identity::{IdentitySignal, IdentityState};
use crate::lock;
use crate::provider::{CollectionProvider, Delivery, DeliverySink, Subscription};
use journal_engine::{Effect, EntryQuery, Generation, JournalSync, Phase, SyncState};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

type DeliveryTx = mpsc::UnboundedSender<(Generation, Delivery)>;
type DeliveryRx = mpsc::UnboundedReceiver<(Generation, Delivery)>;

struct Shared {
    machine: JournalSync,
    subscription: Option<(Generation, Subscription)>,
    deliveries: Option<DeliveryTx>,
}

struct StoreInner<P> {
    provider: Arc<P>,
    identity: IdentitySignal,
    query: EntryQuery,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<SyncState>,
}

impl<P: CollectionProvider> StoreInner<P> {
    async fn drive(
        self: Arc<Self>,
        mut identity: watch::Receiver<IdentityState>,
        mut deliveries: DeliveryRx,
    ) {
        let initial = identity.borrow_and_update().clone();
        self.apply_identity(&initial);

        loop {
            tokio::select! {
                changed = identity.changed() => {
                    if changed.is_err() {
                        tracing::debug!("identity signal dropped; journal store driver exiting");
                        break;
                    }
                    let state = identity.borrow_and_update().clone();
                    self.apply_identity(&state);
                }
                delivery = deliveries.recv() => match delivery {
                    Some((generation, delivery)) => self.apply_delivery(generation, delivery),
                    None => break,
                },
            }
        }
    }

    fn apply_identity(&self, identity: &IdentityState) {
        if identity.loading {
            return;
        }

        let mut shared = lock(&self.shared);
        let effects = shared.machine.on_identity(identity.owner.clone());
        if effects.is_empty() {
            return;
        }
        for effect in effects {
            self.run_effect(&mut shared, effect);
        }
        self.publish(shared.machine.state());
    }

    fn apply_delivery(&self, generation: Generation, delivery: Delivery) {
        let mut shared = lock(&self.shared);
        let applied = match delivery {
            Ok(entries) => {
                let count = entries.len();
                let applied = shared.machine.on_entries(generation, entries);
                if applied {
                    tracing::debug!(generation, count, "journal snapshot applied");
                }
                applied
            }
            Err(message) => {
                let error = journal_engine::Error::Subscription(message);
                let applied = shared.machine.on_error(generation, error.to_string());
                if applied {
                    tracing::error!(generation, error = %error, "journal subscription error");
                }
                applied
            }
        };

        if applied {
            self.publish(shared.machine.state());
        } else {
            tracing::trace!(generation, "discarding stale delivery");
        }
    }

    fn run_effect(&self, shared: &mut Shared, effect: Effect) {
        match effect {
            Effect::Close { generation } => {
                if let Some((open, mut subscription)) = shared.subscription.take() {
                    if open != generation {
                        tracing::warn!(open, generation, "closing mismatched subscription");
                    }
                    subscription.close();
                    tracing::debug!(generation, "journal subscription closed");
                }
            }
            Effect::Open { owner, generation } => {
                let Some(tx) = shared.deliveries.clone() else {
                    return;
                };
                let sink = DeliverySink::new(generation, tx);
                let subscription = self.provider.open_subscription(&owner, self.query, sink);
                tracing::info!(owner = %owner, generation, "journal subscription opened");
                shared.subscription = Some((generation, subscription));
            }
        }
    }

    fn publish(&self, state: &SyncState) {
        self.state_tx.send_if_modified(|current| {
            if current == state {
                return false;
            }
            *current = state.clone();
            true
        });
    }
}

/// Identity-scoped live view over the owner's journal entries.
///
/// Nothing happens until [`init`](Self::init). Dropping the store tears it
/// down.
pub struct JournalStore<P: CollectionProvider> {
    inner: Arc<StoreInner<P>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<P: CollectionProvider> JournalStore<P> {
    /// Create a store ordered newest first.
    pub fn new(provider: Arc<P>, identity: IdentitySignal) -> Self {
        Self::with_query(provider, identity, EntryQuery::newest_first())
    }

    pub fn with_query(provider: Arc<P>, identity: IdentitySignal, query: EntryQuery) -> Self {
        let (state_tx, _) = watch::channel(SyncState::default());
        Self {
            inner: Arc::new(StoreInner {
                provider,
                identity,
                query,
                shared: Mutex::new(Shared {
                    machine: JournalSync::new(),
                    subscription: None,
                    deliveries: None,
                }),
                state_tx,
            }),
            driver: Mutex::new(None),
        }
    }

    /// Start following identity. Must be called from within a Tokio runtime.
    ///
    /// Returns `false` when already initialized; a second call opens no
    /// additional subscription.
    pub fn init(&self) -> bool {
        let mut driver = lock(&self.driver);
        let rx = {
            let mut shared = lock(&self.inner.shared);
            if !shared.machine.start() {
                return false;
            }
            let (tx, rx) = mpsc::unbounded_channel();
            shared.deliveries = Some(tx);
            rx
        };

        let identity = self.inner.identity.subscribe();
        let inner = self.inner.clone();
        *driver = Some(tokio::spawn(inner.drive(identity, rx)));
        tracing::debug!("journal store initialized");
        true
    }

    /// Close any subscription and return to the initial state.
    ///
    /// The store can be initialized again afterwards.
    pub fn destroy(&self) {
        if let Some(driver) = lock(&self.driver).take() {
            driver.abort();
        }

        let mut shared = lock(&self.inner.shared);
        for effect in shared.machine.destroy() {
            self.inner.run_effect(&mut shared, effect);
        }
        shared.subscription = None;
        shared.deliveries = None;
        self.inner.publish(shared.machine.state());
        tracing::debug!("journal store destroyed");
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SyncState {
        self.inner.state_tx.borrow().clone()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state_tx.subscribe()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.inner.shared).machine.phase().clone()
    }

    pub fn identity(&self) -> &IdentitySignal {
        &self.inner.identity
    }
}

impl<P: CollectionProvider> Drop for JournalStore<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}
