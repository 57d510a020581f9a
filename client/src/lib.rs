//! # Journal Client
//!
//! Async runtime around [`journal_engine`]: the identity signal, the live
//! journal store, the time settings store and one-shot entry queries,
//! over a pluggable [`CollectionProvider`].
//!
//! ## Example
//!
//! ```no_run
//! use journal_client::{JournalSession, MemoryProvider};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let session = JournalSession::new(Arc::new(MemoryProvider::new()));
//! session.init();
//! session.identity().sign_in("user-1");
//!
//! let mut snapshots = session.journal().subscribe();
//! while snapshots.changed().await.is_ok() {
//!     let state = snapshots.borrow_and_update().clone();
//!     println!("{} entries", state.entries.len());
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod memory;
pub mod provider;
pub mod queries;
pub mod session;
pub mod settings;
pub mod store;

pub use config::{ClientConfig, ConfigError};
pub use error::ProviderError;
pub use http::HttpProvider;
pub use identity::{IdentitySignal, IdentityState};
pub use memory::MemoryProvider;
pub use provider::{CollectionProvider, Delivery, DeliverySink, SettingsProvider, Subscription};
pub use queries::{now_millis, JournalQueries};
pub use session::JournalSession;
pub use settings::TimeSettingsStore;
pub use store::JournalStore;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
