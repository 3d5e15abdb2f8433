use crate::domain::{MessageHandle, ParticipantId, ParticipantIdentity, SessionId, SessionStatus};
use crate::traits::{GameSession, SessionError, SharedSession};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

#[derive(Default)]
struct RegistryMaps {
    by_identity: HashMap<ParticipantIdentity, SharedSession>,
    by_participant: HashMap<ParticipantId, Vec<SharedSession>>,
    by_message: HashMap<MessageHandle, SharedSession>,
}

/// In-memory authority mapping participant sets and messages to sessions
///
/// Three maps are kept in step:
/// - identity -> session (unique)
/// - participant -> sessions they take part in (insertion order)
/// - message handle -> owning session (unique)
///
/// A session reachable through the identity map is reachable through the
/// participant map for each of its participants, and vice versa.
#[derive(Default)]
pub struct SessionRegistry {
    maps: RwLock<RegistryMaps>,
}

/// Serializable view of the registry for status output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub sessions: Vec<SessionSummary>,
    pub participants: usize,
    pub bound_messages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub game: String,
    pub status: SessionStatus,
    pub participants: Vec<String>,
}

/// Outcome of [`SessionRegistry::shutdown_all`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShutdownReport {
    pub ended: Vec<SessionId>,
    pub failures: Vec<ShutdownFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShutdownFailure {
    pub session_id: SessionId,
    pub reason: String,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryMaps> {
        self.maps.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryMaps> {
        self.maps.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `session` under `identity`
    ///
    /// Returns false without touching anything if the exact identity is
    /// already taken.
    pub fn reserve(&self, identity: &ParticipantIdentity, session: SharedSession) -> bool {
        let mut maps = self.write();

        if maps.by_identity.contains_key(identity) {
            debug!(%identity, "Identity already reserved");
            return false;
        }

        for participant in identity.ids() {
            maps.by_participant
                .entry(*participant)
                .or_default()
                .push(session.clone());
        }

        debug!(session_id = %session.id(), game = session.game(), "Reserved session");
        maps.by_identity.insert(identity.clone(), session);
        true
    }

    /// Remove and return the session registered for `identity`
    ///
    /// Releasing an unknown identity returns `None` and changes nothing.
    pub fn release(&self, identity: &ParticipantIdentity) -> Option<SharedSession> {
        Self::remove_entry(&mut self.write(), identity)
    }

    /// Release `session`'s identity only if it is still registered to this
    /// very session
    ///
    /// Used by a session's own teardown so a late teardown cannot release a
    /// newer session that reserved the same identity.
    pub fn release_session(&self, session: &dyn GameSession) -> bool {
        let mut maps = self.write();

        let owned = maps
            .by_identity
            .get(session.identity())
            .is_some_and(|registered| registered.id() == session.id());
        if !owned {
            return false;
        }

        Self::remove_entry(&mut maps, session.identity()).is_some()
    }

    fn remove_entry(
        maps: &mut RegistryMaps,
        identity: &ParticipantIdentity,
    ) -> Option<SharedSession> {
        let session = maps.by_identity.remove(identity)?;
        let id = session.id();

        for participant in identity.ids() {
            let now_empty = match maps.by_participant.get_mut(participant) {
                Some(sessions) => {
                    sessions.retain(|s| s.id() != id);
                    sessions.is_empty()
                }
                None => false,
            };

            if now_empty {
                maps.by_participant.remove(participant);
            }
        }

        debug!(session_id = %id, "Released session");
        Some(session)
    }

    pub fn lookup_by_identity(&self, identity: &ParticipantIdentity) -> Option<SharedSession> {
        self.read().by_identity.get(identity).cloned()
    }

    /// Every session `participant` takes part in, oldest first
    pub fn sessions_for(&self, participant: ParticipantId) -> Vec<SharedSession> {
        self.read()
            .by_participant
            .get(&participant)
            .cloned()
            .unwrap_or_default()
    }

    pub fn bind_message(&self, message: MessageHandle, session: SharedSession) {
        debug!(%message, session_id = %session.id(), "Bound message");
        self.write().by_message.insert(message, session);
    }

    pub fn unbind_message(&self, message: MessageHandle) -> bool {
        self.write().by_message.remove(&message).is_some()
    }

    pub fn session_for_message(&self, message: MessageHandle) -> Option<SharedSession> {
        self.read().by_message.get(&message).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let maps = self.read();

        let mut sessions: Vec<SessionSummary> = maps
            .by_identity
            .values()
            .map(|session| SessionSummary {
                id: session.id(),
                game: session.game().to_string(),
                status: session.status(),
                participants: session
                    .participants()
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect(),
            })
            .collect();
        sessions.sort_by(|a, b| {
            a.game
                .cmp(&b.game)
                .then_with(|| a.participants.cmp(&b.participants))
        });

        RegistrySnapshot {
            sessions,
            participants: maps.by_participant.len(),
            bound_messages: maps.by_message.len(),
        }
    }

    /// End every registered session, then clear all maps
    ///
    /// Works on a copy of the registered sessions since each `end` releases
    /// itself. Every `end` runs in its own task; errors and panics are
    /// collected in the report and never stop the remaining teardowns.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown_all(&self) -> ShutdownReport {
        let sessions: Vec<SharedSession> = self.read().by_identity.values().cloned().collect();
        info!("🛑 Shutting down {} session(s)", sessions.len());

        let (ids, tasks): (Vec<SessionId>, Vec<_>) = sessions
            .into_iter()
            .map(|session| (session.id(), tokio::spawn(async move { session.end().await })))
            .unzip();

        let mut report = ShutdownReport::default();
        for (session_id, outcome) in ids.into_iter().zip(join_all(tasks).await) {
            let reason = match outcome {
                Ok(Ok(())) => {
                    report.ended.push(session_id);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(e) if e.is_panic() => SessionError::Panicked(session_id).to_string(),
                Err(e) => e.to_string(),
            };

            warn!(%session_id, %reason, "⚠️ Session failed to shut down cleanly");
            report.failures.push(ShutdownFailure { session_id, reason });
        }

        {
            let mut maps = self.write();
            maps.by_identity.clear();
            maps.by_participant.clear();
            maps.by_message.clear();
        }

        info!(
            ended = report.ended.len(),
            failed = report.failures.len(),
            "✅ Shutdown complete"
        );
        report
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let maps = self.read();
        f.debug_struct("SessionRegistry")
            .field("sessions", &maps.by_identity.len())
            .field("participants", &maps.by_participant.len())
            .field("messages", &maps.by_message.len())
            .finish()
    }
}
