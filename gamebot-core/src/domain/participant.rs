use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a participant as handed out by the chat platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        ParticipantId(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        ParticipantId(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user taking part in one or more game sessions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier for this participant
    id: ParticipantId,
    /// Display name used in mentions
    name: String,
}

/// Errors that can occur when working with participants
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParticipantError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name must be between 1 and 50 characters")]
    InvalidNameLength,

    #[error("A session needs at least one participant")]
    EmptyParticipantSet,
}

impl Participant {
    /// Create a participant with a fresh identifier
    pub fn new(name: impl Into<String>) -> Result<Self, ParticipantError> {
        Self::with_id(ParticipantId::new(), name)
    }

    /// Create a participant with a known identifier
    pub fn with_id(id: ParticipantId, name: impl Into<String>) -> Result<Self, ParticipantError> {
        let name = name.into();
        Self::validate_name(&name)?;

        Ok(Participant { id, name })
    }

    fn validate_name(name: &str) -> Result<(), ParticipantError> {
        if name.is_empty() {
            return Err(ParticipantError::EmptyName);
        }

        if name.chars().count() > 50 {
            return Err(ParticipantError::InvalidNameLength);
        }

        Ok(())
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text used to address this participant in a message
    pub fn mention(&self) -> String {
        format!("@{}", self.name)
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Order-independent key for a set of participants
///
/// The ids are sorted and de-duplicated once on construction, so two
/// identities compare equal exactly when their participant sets are equal.
/// Overlapping but different sets are distinct identities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantIdentity(Vec<ParticipantId>);

impl ParticipantIdentity {
    pub fn new(ids: impl IntoIterator<Item = ParticipantId>) -> Result<Self, ParticipantError> {
        let mut ids: Vec<ParticipantId> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(ParticipantError::EmptyParticipantSet);
        }

        ids.sort_unstable();
        ids.dedup();

        Ok(ParticipantIdentity(ids))
    }

    pub fn from_participants<'a>(
        participants: impl IntoIterator<Item = &'a Participant>,
    ) -> Result<Self, ParticipantError> {
        Self::new(participants.into_iter().map(Participant::id))
    }

    pub fn ids(&self) -> &[ParticipantId] {
        &self.0
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParticipantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", ids.join(", "))
    }
}
