use crate::domain::{Participant, ParticipantIdentity, SessionEvent, SessionId, SessionStatus};
use crate::traits::TransportError;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to a running session, as stored in the registry
pub type SharedSession = Arc<dyn GameSession>;

/// Lifecycle contract every game implements
///
/// A session moves `Created -> Active -> Ended`. Events for one session are
/// handled one at a time in delivery order; different sessions run
/// concurrently.
#[async_trait]
pub trait GameSession: Send + Sync {
    fn id(&self) -> SessionId;

    /// Catalog name of the game (e.g. "tictactoe")
    fn game(&self) -> &str;

    /// Participants in the order they were given on the command
    fn participants(&self) -> &[Participant];

    fn identity(&self) -> &ParticipantIdentity;

    fn status(&self) -> SessionStatus;

    /// Establish the initial state and UI. `Created -> Active`.
    ///
    /// Message handles that should be routed back to this session are bound
    /// in the registry here.
    async fn begin(&self) -> Result<(), SessionError>;

    /// Process one event
    ///
    /// Must be a no-op when the session is not active or the event kind is
    /// not one the game cares about. Events from participants who are not
    /// the current actor are ignored apart from optional feedback.
    async fn handle(&self, event: SessionEvent) -> Result<(), SessionError>;

    /// Tear the session down. `Active -> Ended`.
    ///
    /// Safe to call any number of times: only the first call unbinds the
    /// session's messages and releases its registry entry.
    async fn end(&self) -> Result<(), SessionError>;
}

/// Invalid session construction parameters; the text is shown to users
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("You didn't tell me who to play this game with!")]
    NotEnoughPlayers,

    #[error("That's too many people! This game can only be played with {max} people.")]
    TooManyPlayers { max: usize },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Session {0} panicked during teardown")]
    Panicked(SessionId),
}
