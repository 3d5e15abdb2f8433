use crate::domain::ParticipantId;
use crate::traits::{AppPreferences, PreferenceStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

/// Process-local preference store
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    players: RwLock<HashMap<ParticipantId, BTreeMap<String, AppPreferences>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, participant: ParticipantId, app: &str, key: &str) -> Option<String> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&participant)
            .and_then(|apps| apps.get(app))
            .and_then(|settings| settings.get(key))
            .cloned()
    }

    fn set(&self, participant: ParticipantId, app: &str, key: &str, value: String) {
        tracing::debug!(%participant, app, key, %value, "Storing preference");
        self.players
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(participant)
            .or_default()
            .entry(app.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn all_for(&self, participant: ParticipantId) -> BTreeMap<String, AppPreferences> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&participant)
            .cloned()
            .unwrap_or_default()
    }
}
