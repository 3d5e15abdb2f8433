use crate::domain::{MessageHandle, ParticipantId};
use crate::traits::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// A marker (reaction) on a message; `by == None` means the bot added it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub symbol: String,
    pub by: Option<ParticipantId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredMessage {
    pub content: String,
    pub markers: Vec<Marker>,
}

/// Operations that changed platform state, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    Send {
        message: MessageHandle,
        content: String,
    },
    Edit {
        message: MessageHandle,
        content: String,
    },
    Delete {
        message: MessageHandle,
    },
    AddMarker {
        message: MessageHandle,
        symbol: String,
    },
    RemoveMarker {
        message: MessageHandle,
        symbol: String,
        participant: ParticipantId,
    },
    ClearMarkers {
        message: MessageHandle,
    },
}

/// In-process stand-in for a chat channel
///
/// Keeps every live message and an operation log. Used by the console
/// front-end and as the transport in tests.
#[derive(Debug)]
pub struct MemoryTransport {
    next_handle: AtomicU64,
    messages: RwLock<BTreeMap<MessageHandle, StoredMessage>>,
    log: RwLock<Vec<TransportOp>>,
    unavailable: AtomicBool,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            messages: RwLock::new(BTreeMap::new()),
            log: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every following call fail with `Unavailable` (or recover)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remove a message behind the bot's back, as a moderator would
    pub fn forget(&self, message: MessageHandle) -> bool {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&message)
            .is_some()
    }

    /// Record a participant's marker, as the platform does when a user reacts
    pub fn react(
        &self,
        message: MessageHandle,
        symbol: &str,
        participant: ParticipantId,
    ) -> Result<(), TransportError> {
        let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
        let stored = messages
            .get_mut(&message)
            .ok_or(TransportError::NotFound(message))?;
        stored.markers.push(Marker {
            symbol: symbol.to_string(),
            by: Some(participant),
        });
        Ok(())
    }

    pub fn message(&self, message: MessageHandle) -> Option<StoredMessage> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message)
            .cloned()
    }

    pub fn content(&self, message: MessageHandle) -> Option<String> {
        self.message(message).map(|m| m.content)
    }

    pub fn contains(&self, message: MessageHandle) -> bool {
        self.message(message).is_some()
    }

    /// Handles of all messages still on the platform, oldest first
    pub fn live_messages(&self) -> Vec<MessageHandle> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    pub fn ops(&self) -> Vec<TransportOp> {
        self.log.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Contents of every message sent so far
    pub fn sent_contents(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                TransportOp::Send { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.log.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, op: TransportOp) {
        tracing::trace!(?op, "transport op");
        self.log.write().unwrap_or_else(PoisonError::into_inner).push(op);
    }

    fn check_available(&self) -> Result<(), TransportError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable(
                "memory transport switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, content: &str) -> Result<MessageHandle, TransportError> {
        self.check_available()?;

        let message = MessageHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                message,
                StoredMessage {
                    content: content.to_string(),
                    markers: Vec::new(),
                },
            );

        self.record(TransportOp::Send {
            message,
            content: content.to_string(),
        });
        Ok(message)
    }

    async fn edit(&self, message: MessageHandle, content: &str) -> Result<(), TransportError> {
        self.check_available()?;

        {
            let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
            let stored = messages
                .get_mut(&message)
                .ok_or(TransportError::NotFound(message))?;
            stored.content = content.to_string();
        }

        self.record(TransportOp::Edit {
            message,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, message: MessageHandle) -> Result<(), TransportError> {
        self.check_available()?;

        let removed = self
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&message)
            .is_some();

        if removed {
            self.record(TransportOp::Delete { message });
        }
        Ok(())
    }

    async fn add_marker(&self, message: MessageHandle, symbol: &str) -> Result<(), TransportError> {
        self.check_available()?;

        {
            let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
            let stored = messages
                .get_mut(&message)
                .ok_or(TransportError::NotFound(message))?;
            stored.markers.push(Marker {
                symbol: symbol.to_string(),
                by: None,
            });
        }

        self.record(TransportOp::AddMarker {
            message,
            symbol: symbol.to_string(),
        });
        Ok(())
    }

    async fn remove_marker(
        &self,
        message: MessageHandle,
        symbol: &str,
        participant: ParticipantId,
    ) -> Result<(), TransportError> {
        self.check_available()?;

        {
            let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
            let stored = messages
                .get_mut(&message)
                .ok_or(TransportError::NotFound(message))?;
            stored
                .markers
                .retain(|m| !(m.symbol == symbol && m.by == Some(participant)));
        }

        self.record(TransportOp::RemoveMarker {
            message,
            symbol: symbol.to_string(),
            participant,
        });
        Ok(())
    }

    async fn clear_markers(&self, message: MessageHandle) -> Result<(), TransportError> {
        self.check_available()?;

        {
            let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
            let stored = messages
                .get_mut(&message)
                .ok_or(TransportError::NotFound(message))?;
            stored.markers.clear();
        }

        self.record(TransportOp::ClearMarkers { message });
        Ok(())
    }
}
