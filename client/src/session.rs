//! One object bundling everything a journal UI needs.

use crate::identity::IdentitySignal;
use crate::provider::{CollectionProvider, SettingsProvider};
use crate::queries::JournalQueries;
use crate::settings::TimeSettingsStore;
use crate::store::JournalStore;
use std::sync::Arc;

/// Identity signal, live entry store, settings store and one-shot queries
/// over a single provider.
///
/// The session is an explicit context object; create one per signed-in
/// surface and pass it where it is needed.
pub struct JournalSession<P: CollectionProvider + SettingsProvider> {
    identity: IdentitySignal,
    journal: JournalStore<P>,
    settings: TimeSettingsStore<P>,
    queries: JournalQueries<P>,
}

impl<P: CollectionProvider + SettingsProvider> JournalSession<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self::with_identity(provider, IdentitySignal::new())
    }

    pub fn with_identity(provider: Arc<P>, identity: IdentitySignal) -> Self {
        Self {
            journal: JournalStore::new(provider.clone(), identity.clone()),
            settings: TimeSettingsStore::new(provider.clone(), identity.clone()),
            queries: JournalQueries::new(provider, identity.clone()),
            identity,
        }
    }

    /// Start both stores. Safe to call more than once.
    pub fn init(&self) {
        let journal = self.journal.init();
        let settings = self.settings.init();
        if journal || settings {
            tracing::info!("journal session started");
        }
    }

    pub fn destroy(&self) {
        self.journal.destroy();
        self.settings.destroy();
        tracing::info!("journal session stopped");
    }

    pub fn identity(&self) -> &IdentitySignal {
        &self.identity
    }

    pub fn journal(&self) -> &JournalStore<P> {
        &self.journal
    }

    pub fn settings(&self) -> &TimeSettingsStore<P> {
        &self.settings
    }

    pub fn queries(&self) -> &JournalQueries<P> {
        &self.queries
    }
}
