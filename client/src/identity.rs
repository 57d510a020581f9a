//! The identity signal.
//!
//! A watchable `{owner, loading}` pair. While `loading` is set the stores
//! ignore the value; once resolved, each change is delivered to every
//! subscriber.

use journal_engine::OwnerId;
use std::sync::Arc;
use tokio::sync::watch;

/// Current identity as seen by the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityState {
    pub owner: Option<OwnerId>,
    /// Identity has not been resolved yet
    pub loading: bool,
}

impl Default for IdentityState {
    fn default() -> Self {
        Self {
            owner: None,
            loading: true,
        }
    }
}

impl IdentityState {
    /// The owner once resolved, `None` while loading or signed out.
    pub fn resolved_owner(&self) -> Option<&str> {
        if self.loading {
            None
        } else {
            self.owner.as_deref()
        }
    }
}

/// Shared identity source. Cloning yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct IdentitySignal {
    tx: Arc<watch::Sender<IdentityState>>,
}

impl Default for IdentitySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySignal {
    /// A signal that is still loading.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(IdentityState::default());
        Self { tx: Arc::new(tx) }
    }

    /// A signal already resolved to `owner`.
    pub fn resolved(owner: Option<OwnerId>) -> Self {
        let signal = Self::new();
        signal.resolve(owner);
        signal
    }

    /// Publish a resolved identity.
    pub fn resolve(&self, owner: Option<OwnerId>) {
        tracing::debug!(owner = ?owner, "identity resolved");
        self.tx.send_replace(IdentityState {
            owner,
            loading: false,
        });
    }

    pub fn sign_in(&self, owner: impl Into<OwnerId>) {
        self.resolve(Some(owner.into()));
    }

    pub fn sign_out(&self) {
        self.resolve(None);
    }

    /// Put the signal back into the loading state.
    pub fn set_loading(&self) {
        self.tx.send_modify(|state| state.loading = true);
    }

    pub fn current(&self) -> IdentityState {
        self.tx.borrow().clone()
    }

    /// Owner right now, or `None` when loading or signed out.
    pub fn owner(&self) -> Option<OwnerId> {
        self.tx.borrow().resolved_owner().map(str::to_owned)
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.tx.subscribe()
    }
}
