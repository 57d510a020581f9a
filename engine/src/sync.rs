//! Identity-scoped sync - mirrors one identity's live collection.
//!
//! [`JournalSync`] owns the mapping from "current identity" to "live
//! subscription". It is driven by two kinds of events:
//!
//! 1. identity changes ([`JournalSync::on_identity`])
//! 2. subscription deliveries ([`JournalSync::on_entries`] and
//!    [`JournalSync::on_error`])
//!
//! and answers with [`Effect`]s the runtime must carry out against the
//! provider. Every subscription it asks for is tagged with a fresh
//! [`Generation`]; deliveries carrying any other generation are discarded,
//! which is what keeps a torn-down subscription's late callback from ever
//! reaching the snapshot.

use crate::{Generation, JournalEntry, OwnerId};
use serde::{Deserialize, Serialize};

/// The externally observed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// Entries in provider order (newest first)
    pub entries: Vec<JournalEntry>,
    /// True while a subscription is being established
    pub is_loading: bool,
    /// Last error message, empty when none
    pub error: String,
    /// True once a snapshot was delivered for the current identity (or lack of one)
    pub is_initialized: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            is_loading: true,
            error: String::new(),
            is_initialized: false,
        }
    }
}

impl SyncState {
    /// The settled state for a signed-out user.
    pub fn signed_out() -> Self {
        Self {
            entries: Vec::new(),
            is_loading: false,
            error: String::new(),
            is_initialized: true,
        }
    }

    /// Check whether the snapshot carries an error.
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Lifecycle phase of the sync machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Not started, or destroyed
    Uninitialized,
    /// Started and settled with no identity
    NoIdentity,
    /// Subscription requested, nothing delivered yet
    SubscriptionPending {
        owner: OwnerId,
        generation: Generation,
    },
    /// At least one delivery arrived for the current subscription
    SubscriptionActive {
        owner: OwnerId,
        generation: Generation,
    },
}

/// Work the runtime must perform on the machine's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a live subscription for `owner`, tagging deliveries with `generation`.
    Open {
        owner: OwnerId,
        generation: Generation,
    },
    /// Close the subscription opened under `generation`.
    Close { generation: Generation },
}

/// The identity-scoped sync state machine.
#[derive(Debug, Clone)]
pub struct JournalSync {
    phase: Phase,
    state: SyncState,
    started: bool,
    /// Whether an identity value has been observed since start
    observed: bool,
    /// Last generation handed out; never reset so tokens stay unique
    last_generation: Generation,
}

impl Default for JournalSync {
    fn default() -> Self {
        Self::new()
    }
}

impl JournalSync {
    /// Create a machine in the `Uninitialized` phase.
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            state: SyncState::default(),
            started: false,
            observed: false,
            last_generation: 0,
        }
    }

    /// Begin observing identity.
    ///
    /// Returns `false` if the machine was already started, in which case
    /// nothing changes.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Whether [`start`](Self::start) has been called since the last destroy.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Current snapshot.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Identity the machine is currently scoped to.
    pub fn current_owner(&self) -> Option<&str> {
        match &self.phase {
            Phase::SubscriptionPending { owner, .. } | Phase::SubscriptionActive { owner, .. } => {
                Some(owner)
            }
            Phase::Uninitialized | Phase::NoIdentity => None,
        }
    }

    /// Generation of the subscription that is currently allowed to deliver.
    pub fn active_generation(&self) -> Option<Generation> {
        match &self.phase {
            Phase::SubscriptionPending { generation, .. }
            | Phase::SubscriptionActive { generation, .. } => Some(*generation),
            Phase::Uninitialized | Phase::NoIdentity => None,
        }
    }

    /// React to a resolved identity value.
    ///
    /// The same identity twice in a row is a no-op. Any other change tears
    /// down the current subscription before anything else happens.
    pub fn on_identity(&mut self, owner: Option<OwnerId>) -> Vec<Effect> {
        if !self.started {
            return Vec::new();
        }
        if self.observed && self.current_owner() == owner.as_deref() {
            return Vec::new();
        }
        self.observed = true;

        let mut effects = Vec::with_capacity(2);
        if let Some(generation) = self.active_generation() {
            effects.push(Effect::Close { generation });
        }

        match owner {
            None => {
                self.phase = Phase::NoIdentity;
                self.state = SyncState::signed_out();
            }
            Some(owner) => {
                self.last_generation += 1;
                let generation = self.last_generation;
                self.phase = Phase::SubscriptionPending {
                    owner: owner.clone(),
                    generation,
                };
                // Entries stay visible until the new subscription replaces them.
                self.state.is_loading = true;
                self.state.error.clear();
                effects.push(Effect::Open { owner, generation });
            }
        }

        effects
    }

    /// Apply a successful delivery.
    ///
    /// Returns `false` (and changes nothing) when `generation` is not the
    /// current subscription's.
    pub fn on_entries(&mut self, generation: Generation, entries: Vec<JournalEntry>) -> bool {
        let owner = match self.accepting_owner(generation) {
            Some(owner) => owner,
            None => return false,
        };

        self.phase = Phase::SubscriptionActive { owner, generation };
        self.state = SyncState {
            entries,
            is_loading: false,
            error: String::new(),
            is_initialized: true,
        };
        true
    }

    /// Apply a failed delivery.
    ///
    /// The last known entries are kept. Returns `false` for a stale
    /// generation.
    pub fn on_error(&mut self, generation: Generation, message: impl Into<String>) -> bool {
        if self.accepting_owner(generation).is_none() {
            return false;
        }

        self.state.is_loading = false;
        self.state.is_initialized = true;
        self.state.error = message.into();
        true
    }

    /// Tear everything down and return to `Uninitialized`.
    pub fn destroy(&mut self) -> Vec<Effect> {
        let effects = self
            .active_generation()
            .map(|generation| vec![Effect::Close { generation }])
            .unwrap_or_default();

        self.phase = Phase::Uninitialized;
        self.state = SyncState::default();
        self.started = false;
        self.observed = false;

        effects
    }

    fn accepting_owner(&self, generation: Generation) -> Option<OwnerId> {
        match &self.phase {
            Phase::SubscriptionPending {
                owner,
                generation: current,
            }
            | Phase::SubscriptionActive {
                owner,
                generation: current,
            } if *current == generation => Some(owner.clone()),
            _ => None,
        }
    }
}
