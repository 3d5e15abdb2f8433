use crate::domain::ParticipantId;
use std::collections::BTreeMap;

/// App name under which settings shared by every game are stored
pub const GLOBAL_APP: &str = "global";

/// Settings of one app, keyed by setting name
pub type AppPreferences = BTreeMap<String, String>;

/// A customizable setting advertised by a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceKey {
    pub key: &'static str,
    pub description: &'static str,
}

impl PreferenceKey {
    pub const fn new(key: &'static str, description: &'static str) -> Self {
        Self { key, description }
    }
}

/// Per-participant preference storage, keyed by `(participant, app, key)`
///
/// The core only reads and writes values; lifecycle and persistence belong
/// to the implementation.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, participant: ParticipantId, app: &str, key: &str) -> Option<String>;

    fn set(&self, participant: ParticipantId, app: &str, key: &str, value: String);

    /// Every stored setting of a participant, grouped by app
    fn all_for(&self, participant: ParticipantId) -> BTreeMap<String, AppPreferences>;

    fn all_for_app(&self, participant: ParticipantId, app: &str) -> AppPreferences {
        self.all_for(participant).remove(app).unwrap_or_default()
    }
}
