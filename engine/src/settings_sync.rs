//! Identity-scoped time settings.
//!
//! Same scoping rules as [`JournalSync`](crate::JournalSync), but the
//! settings document is loaded once per identity instead of being kept
//! live. Loads are generation tagged so a slow load for a previous
//! identity cannot overwrite the current one.

use crate::error::{Error, Result};
use crate::{Generation, OwnerId, StoredTimeSettings, TimeSettings};
use serde::{Deserialize, Serialize};

/// The externally observed settings snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSettingsState {
    pub settings: TimeSettings,
    pub is_loading: bool,
    pub is_initialized: bool,
    pub error: String,
    pub saving: bool,
}

impl Default for TimeSettingsState {
    fn default() -> Self {
        Self {
            settings: TimeSettings::default(),
            is_loading: true,
            is_initialized: false,
            error: String::new(),
            saving: false,
        }
    }
}

/// Work requested by [`SettingsSync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEffect {
    /// Read the settings document of `owner`.
    Load {
        owner: OwnerId,
        generation: Generation,
    },
}

/// A save that has been admitted and must be written by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub owner: OwnerId,
    pub generation: Generation,
    pub settings: TimeSettings,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsSync {
    state: TimeSettingsState,
    owner: Option<OwnerId>,
    started: bool,
    observed: bool,
    generation: Generation,
}

impl SettingsSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin observing identity. Returns `false` when already started.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    pub fn state(&self) -> &TimeSettingsState {
        &self.state
    }

    pub fn current_owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn on_identity(&mut self, owner: Option<OwnerId>) -> Option<SettingsEffect> {
        if !self.started {
            return None;
        }
        if self.observed && self.owner == owner {
            return None;
        }
        self.observed = true;
        self.generation += 1;
        self.owner = owner.clone();

        match owner {
            None => {
                self.state = TimeSettingsState {
                    settings: TimeSettings::default(),
                    is_loading: false,
                    is_initialized: true,
                    error: String::new(),
                    saving: false,
                };
                None
            }
            Some(owner) => {
                self.state.is_loading = true;
                self.state.error.clear();
                Some(SettingsEffect::Load {
                    owner,
                    generation: self.generation,
                })
            }
        }
    }

    /// Apply a finished load. `None` means no document exists yet.
    pub fn on_loaded(
        &mut self,
        generation: Generation,
        stored: Option<StoredTimeSettings>,
    ) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state.settings = stored.map(|s| s.resolve()).unwrap_or_default();
        self.state.is_loading = false;
        self.state.is_initialized = true;
        true
    }

    pub fn on_load_error(&mut self, generation: Generation, message: impl Into<String>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.state.error = message.into();
        self.state.is_loading = false;
        self.state.is_initialized = true;
        true
    }

    /// Admit a save for the given identity.
    ///
    /// Without an identity the snapshot records the failure and
    /// [`Error::NotAuthenticated`] is returned; nothing should be written.
    pub fn begin_save(
        &mut self,
        owner: Option<OwnerId>,
        settings: TimeSettings,
    ) -> Result<PendingSave> {
        let owner = match owner {
            Some(owner) => owner,
            None => {
                self.state.error = Error::NotAuthenticated.to_string();
                return Err(Error::NotAuthenticated);
            }
        };

        self.state.saving = true;
        self.state.error.clear();
        Ok(PendingSave {
            owner,
            generation: self.generation,
            settings,
        })
    }

    /// Record a successful write.
    ///
    /// The saved values only replace the snapshot's settings if the identity
    /// has not changed since the save was admitted.
    pub fn on_saved(&mut self, save: &PendingSave) {
        self.state.saving = false;
        if self.is_current(save.generation) {
            self.state.settings = save.settings;
        }
    }

    pub fn on_save_error(&mut self, message: impl Into<String>) {
        self.state.saving = false;
        self.state.error = message.into();
    }

    /// Reset to the initial shape and stop observing identity.
    pub fn destroy(&mut self) {
        self.state = TimeSettingsState::default();
        self.owner = None;
        self.started = false;
        self.observed = false;
        // Invalidate in-flight loads
        self.generation += 1;
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.started && self.owner.is_some() && self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnlockTime;

    fn started() -> SettingsSync {
        let mut sync = SettingsSync::new();
        sync.start();
        sync
    }

    fn load_generation(effect: Option<SettingsEffect>) -> Generation {
        match effect {
            Some(SettingsEffect::Load { generation, .. }) => generation,
            None => panic!("expected a load"),
        }
    }

    fn custom() -> TimeSettings {
        TimeSettings {
            morning_unlock: UnlockTime::new(6, 30).unwrap(),
            ..TimeSettings::default()
        }
    }

    #[test]
    fn initial_state() {
        let sync = SettingsSync::new();
        let state = sync.state();
        assert!(state.is_loading);
        assert!(!state.is_initialized);
        assert!(!state.saving);
        assert_eq!(state.settings, TimeSettings::default());
    }

    #[test]
    fn signed_out_settles_on_defaults() {
        let mut sync = started();
        assert!(sync.on_identity(None).is_none());
        assert!(!sync.state().is_loading);
        assert!(sync.state().is_initialized);
    }

    #[test]
    fn load_missing_document_uses_defaults() {
        let mut sync = started();
        let g = load_generation(sync.on_identity(Some("u1".into())));
        assert!(sync.state().is_loading);

        assert!(sync.on_loaded(g, None));
        assert_eq!(sync.state().settings, TimeSettings::default());
        assert!(sync.state().is_initialized);
    }

    #[test]
    fn load_partial_document() {
        let mut sync = started();
        let g = load_generation(sync.on_identity(Some("u1".into())));
        sync.on_loaded(
            g,
            Some(StoredTimeSettings {
                morning_unlock: Some("06:30".into()),
                ..Default::default()
            }),
        );
        assert_eq!(sync.state().settings, custom());
    }

    #[test]
    fn stale_load_discarded() {
        let mut sync = started();
        let g1 = load_generation(sync.on_identity(Some("u1".into())));
        let g2 = load_generation(sync.on_identity(Some("u2".into())));

        assert!(!sync.on_loaded(g1, Some(custom().into())));
        assert!(!sync.on_load_error(g1, "late"));
        assert!(sync.state().is_loading);

        assert!(sync.on_loaded(g2, None));
        assert!(!sync.state().is_loading);
    }

    #[test]
    fn load_error_recorded() {
        let mut sync = started();
        let g = load_generation(sync.on_identity(Some("u1".into())));
        assert!(sync.on_load_error(g, "unavailable"));
        assert_eq!(sync.state().error, "unavailable");
        assert!(sync.state().is_initialized);
    }

    #[test]
    fn save_without_identity() {
        let mut sync = started();
        sync.on_identity(None);
        let result = sync.begin_save(None, custom());
        assert_eq!(result, Err(Error::NotAuthenticated));
        assert_eq!(sync.state().error, "Not authenticated");
        assert!(!sync.state().saving);
    }

    #[test]
    fn save_round_trip() {
        let mut sync = started();
        let g = load_generation(sync.on_identity(Some("u1".into())));
        sync.on_loaded(g, None);

        let save = sync.begin_save(Some("u1".into()), custom()).unwrap();
        assert!(sync.state().saving);
        sync.on_saved(&save);
        assert!(!sync.state().saving);
        assert_eq!(sync.state().settings, custom());
    }

    #[test]
    fn save_error_keeps_settings() {
        let mut sync = started();
        let g = load_generation(sync.on_identity(Some("u1".into())));
        sync.on_loaded(g, None);

        sync.begin_save(Some("u1".into()), custom()).unwrap();
        sync.on_save_error("denied");
        assert_eq!(sync.state().error, "denied");
        assert!(!sync.state().saving);
        assert_eq!(sync.state().settings, TimeSettings::default());
    }

    #[test]
    fn save_finishing_after_identity_change() {
        let mut sync = started();
        sync.on_identity(Some("u1".into()));
        let save = sync.begin_save(Some("u1".into()), custom()).unwrap();

        sync.on_identity(Some("u2".into()));
        sync.on_saved(&save);
        assert_eq!(sync.state().settings, TimeSettings::default());
    }

    #[test]
    fn destroy_resets() {
        let mut sync = started();
        let g = load_generation(sync.on_identity(Some("u1".into())));
        sync.destroy();
        assert_eq!(sync.state(), &TimeSettingsState::default());
        assert!(!sync.on_loaded(g, None));
        assert!(sync.start());
    }
}
