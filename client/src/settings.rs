//! Identity-scoped time settings store.

use crate::identity::{IdentitySignal, IdentityState};
use crate::lock;
use crate::provider::SettingsProvider;
use chrono::Timelike;
use journal_engine::{
    Generation, OwnerId, Period, SettingsEffect, SettingsSync, StoredTimeSettings, TimeSettings,
    TimeSettingsState, UnlockTime, WriteOutcome,
};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct SettingsInner<P> {
    provider: Arc<P>,
    identity: IdentitySignal,
    machine: Mutex<SettingsSync>,
    state_tx: watch::Sender<TimeSettingsState>,
}

impl<P: SettingsProvider> SettingsInner<P> {
    async fn drive(self: Arc<Self>, mut identity: watch::Receiver<IdentityState>) {
        let initial = identity.borrow_and_update().clone();
        if let Some(load) = self.apply_identity(&initial) {
            Arc::clone(&self).spawn_load(load);
        }

        while identity.changed().await.is_ok() {
            let state = identity.borrow_and_update().clone();
            if let Some(load) = self.apply_identity(&state) {
                Arc::clone(&self).spawn_load(load);
            }
        }
    }

    fn apply_identity(&self, identity: &IdentityState) -> Option<SettingsEffect> {
        if identity.loading {
            return None;
        }

        let mut machine = lock(&self.machine);
        let effect = machine.on_identity(identity.owner.clone());
        self.publish(machine.state());
        effect
    }

    fn spawn_load(self: Arc<Self>, effect: SettingsEffect) {
        let SettingsEffect::Load { owner, generation } = effect;
        tokio::spawn(async move { self.load(owner, generation).await });
    }

    async fn load(&self, owner: OwnerId, generation: Generation) {
        let result = self.provider.load_settings(&owner).await;

        let mut machine = lock(&self.machine);
        let applied = match result {
            Ok(stored) => machine.on_loaded(generation, stored),
            Err(e) => {
                tracing::error!(owner = %owner, error = %e, "error loading time settings");
                machine.on_load_error(generation, e.to_string())
            }
        };
        if applied {
            self.publish(machine.state());
        }
    }

    fn publish(&self, state: &TimeSettingsState) {
        self.state_tx.send_if_modified(|current| {
            if current == state {
                return false;
            }
            *current = state.clone();
            true
        });
    }
}

/// Loads the owner's unlock times once per identity and saves changes.
pub struct TimeSettingsStore<P: SettingsProvider> {
    inner: Arc<SettingsInner<P>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<P: SettingsProvider> TimeSettingsStore<P> {
    pub fn new(provider: Arc<P>, identity: IdentitySignal) -> Self {
        let (state_tx, _) = watch::channel(TimeSettingsState::default());
        Self {
            inner: Arc::new(SettingsInner {
                provider,
                identity,
                machine: Mutex::new(SettingsSync::new()),
                state_tx,
            }),
            driver: Mutex::new(None),
        }
    }

    /// Start following identity. Returns `false` when already initialized.
    pub fn init(&self) -> bool {
        let mut driver = lock(&self.driver);
        if !lock(&self.inner.machine).start() {
            return false;
        }
        let identity = self.inner.identity.subscribe();
        *driver = Some(tokio::spawn(self.inner.clone().drive(identity)));
        true
    }

    pub fn destroy(&self) {
        if let Some(driver) = lock(&self.driver).take() {
            driver.abort();
        }
        let mut machine = lock(&self.inner.machine);
        machine.destroy();
        self.inner.publish(machine.state());
    }

    pub fn snapshot(&self) -> TimeSettingsState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimeSettingsState> {
        self.inner.state_tx.subscribe()
    }

    pub fn settings(&self) -> TimeSettings {
        self.inner.state_tx.borrow().settings
    }

    /// Write all three unlock times for the current identity.
    pub async fn save(&self, settings: TimeSettings) -> WriteOutcome {
        let pending = {
            let mut machine = lock(&self.inner.machine);
            let admitted = machine.begin_save(self.inner.identity.owner(), settings);
            self.inner.publish(machine.state());
            match admitted {
                Ok(pending) => pending,
                Err(e) => return WriteOutcome::failed(e),
            }
        };

        let result = self
            .inner
            .provider
            .save_settings(&pending.owner, StoredTimeSettings::from(pending.settings))
            .await;

        let mut machine = lock(&self.inner.machine);
        let outcome = match result {
            Ok(()) => {
                machine.on_saved(&pending);
                tracing::info!(owner = %pending.owner, "time settings saved");
                WriteOutcome::done()
            }
            Err(e) => {
                tracing::error!(owner = %pending.owner, error = %e, "error saving time settings");
                machine.on_save_error(e.to_string());
                WriteOutcome::failed(e)
            }
        };
        self.inner.publish(machine.state());
        outcome
    }

    /// Periods open right now in local time.
    pub fn unlocked_periods_now(&self) -> Vec<Period> {
        let now = chrono::Local::now();
        match UnlockTime::new(now.hour() as u8, now.minute() as u8) {
            Ok(time) => self.settings().unlocked_periods(time),
            Err(_) => Vec::new(),
        }
    }
}

impl<P: SettingsProvider> Drop for TimeSettingsStore<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}
