use crate::domain::{MessageHandle, ParticipantId};
use async_trait::async_trait;

/// Chat platform operations consumed by sessions and notifiers
///
/// Every call suspends until the platform round-trip completes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post a new message and return its handle
    async fn send(&self, content: &str) -> Result<MessageHandle, TransportError>;

    /// Replace the content of an existing message
    ///
    /// Fails with [`TransportError::NotFound`] when the message is gone.
    async fn edit(&self, message: MessageHandle, content: &str) -> Result<(), TransportError>;

    /// Delete a message; deleting a missing message is a no-op
    async fn delete(&self, message: MessageHandle) -> Result<(), TransportError>;

    /// Add an interaction marker (reaction) on behalf of the bot
    async fn add_marker(&self, message: MessageHandle, symbol: &str) -> Result<(), TransportError>;

    /// Remove one participant's marker from a message
    async fn remove_marker(
        &self,
        message: MessageHandle,
        symbol: &str,
        participant: ParticipantId,
    ) -> Result<(), TransportError>;

    /// Remove every marker from a message
    async fn clear_markers(&self, message: MessageHandle) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TransportError {
    #[error("Message not found: {0}")]
    NotFound(MessageHandle),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    /// The target message no longer exists on the platform
    pub fn is_gone(&self) -> bool {
        matches!(self, TransportError::NotFound(_))
    }
}
