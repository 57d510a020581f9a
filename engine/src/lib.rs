//! # Journal Engine
//!
//! The deterministic core of the wellness journal.
//!
//! This crate holds the data model and the state machines that keep a
//! user's journal in sync with a hosted document store. It performs no IO:
//! every transition is driven by an event passed in by the caller, and every
//! side effect the caller must perform is handed back as an [`Effect`].
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never talks to a network, a clock, or a thread
//! - **Deterministic**: the same event sequence always yields the same state
//! - **Generation tagged**: every subscription or load carries a token so
//!   late deliveries from superseded work are discarded
//!
//! ## Core Concepts
//!
//! ### Entries
//!
//! A [`JournalEntry`] is one day's record: three energy readings and six
//! free-text reflections. New entries are submitted as [`NewEntry`] and
//! edited through an [`EntryPatch`].
//!
//! ### Identity-scoped sync
//!
//! [`JournalSync`] mirrors one identity's remote collection at a time. It
//! reacts to identity changes and subscription deliveries and exposes a
//! [`SyncState`] snapshot:
//!
//! ```rust
//! use journal_engine::{Effect, JournalEntry, JournalSync};
//!
//! let mut sync = JournalSync::new();
//! assert!(sync.start());
//!
//! let effects = sync.on_identity(Some("u1".to_string()));
//! let generation = match effects.as_slice() {
//!     [Effect::Open { generation, .. }] => *generation,
//!     other => panic!("unexpected effects: {other:?}"),
//! };
//!
//! let entry = JournalEntry::builder("e1", "2024-01-01", 10).build();
//! assert!(sync.on_entries(generation, vec![entry]));
//! assert!(sync.state().is_initialized);
//! assert_eq!(sync.state().entries.len(), 1);
//! ```
//!
//! ### Time settings
//!
//! [`SettingsSync`] applies the same identity scoping to the per-period
//! unlock times in [`TimeSettings`].
//!
//! ### Live protocol
//!
//! [`live`] defines the JSON frames a server pushes to live subscribers,
//! and [`api`] the request and response bodies of its HTTP routes.

pub mod api;
pub mod entry;
pub mod error;
pub mod live;
pub mod menu;
pub mod outcome;
pub mod settings;
pub mod settings_sync;
pub mod sync;

// Re-export main types at crate root
pub use api::{CreateEntryRequest, CreatedEntry, ErrorBody};
pub use entry::{
    collection_path, document_path, order_entries, EntryBuilder, EntryPatch, EntryQuery,
    JournalEntry, NewEntry, SortDirection, COLLECTION_NAME, ORDER_FIELD,
};
pub use error::Error;
pub use live::{LiveClientMessage, LiveServerMessage};
pub use menu::{MenuAction, MenuFocus, MenuKey, OutsideDismiss};
pub use outcome::{FetchOutcome, SaveOutcome, WriteOutcome, NOT_AUTHENTICATED};
pub use settings::{
    settings_path, Period, StoredTimeSettings, TimeSettings, UnlockTime, DEFAULT_AFTERNOON_UNLOCK,
    DEFAULT_EVENING_UNLOCK, DEFAULT_MORNING_UNLOCK,
};
pub use settings_sync::{PendingSave, SettingsEffect, SettingsSync, TimeSettingsState};
pub use sync::{Effect, JournalSync, Phase, SyncState};

/// Type aliases for clarity
pub type OwnerId = String;
pub type EntryId = String;
pub type Timestamp = u64;
pub type Generation = u64;
