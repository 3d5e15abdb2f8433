use crate::domain::{MessageHandle, Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw interaction kinds as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    ReactionAdded,
    PreferenceChanged,
    /// Anything this version does not understand
    Other(String),
}

impl InteractionKind {
    pub const REACTION_ADDED: &'static str = "reaction-added";
    pub const PREFERENCE_CHANGED: &'static str = "preference-changed";

    pub fn parse(kind: &str) -> Self {
        match kind {
            Self::REACTION_ADDED => InteractionKind::ReactionAdded,
            Self::PREFERENCE_CHANGED => InteractionKind::PreferenceChanged,
            other => InteractionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InteractionKind::ReactionAdded => Self::REACTION_ADDED,
            InteractionKind::PreferenceChanged => Self::PREFERENCE_CHANGED,
            InteractionKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interaction payload consumed from the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub participant: Participant,
    pub symbol: Option<String>,
    pub message: Option<MessageHandle>,
}

impl Interaction {
    pub fn reaction(
        participant: Participant,
        message: MessageHandle,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            kind: InteractionKind::ReactionAdded,
            participant,
            symbol: Some(symbol.into()),
            message: Some(message),
        }
    }

    pub fn preference_changed(participant: Participant) -> Self {
        Self {
            kind: InteractionKind::PreferenceChanged,
            participant,
            symbol: None,
            message: None,
        }
    }
}

/// Events delivered to a game session's `handle`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[non_exhaustive]
pub enum SessionEvent {
    /// A participant put a marker on one of the session's messages
    ReactionAdded {
        participant: Participant,
        symbol: String,
        message: MessageHandle,
    },

    /// A participant changed one of their stored preferences
    PreferenceChanged { participant: ParticipantId },

    /// Forwarded as-is; sessions are expected to ignore it
    Unrecognized { kind: String },
}

impl SessionEvent {
    pub fn kind(&self) -> &str {
        match self {
            SessionEvent::ReactionAdded { .. } => InteractionKind::REACTION_ADDED,
            SessionEvent::PreferenceChanged { .. } => InteractionKind::PREFERENCE_CHANGED,
            SessionEvent::Unrecognized { kind } => kind,
        }
    }
}
