use crate::application::AppContext;
use crate::domain::{MessageHandle, Participant, ParticipantIdentity, SessionId, SessionStatus};
use crate::traits::{ConfigError, GameSession};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::debug;

/// Lifecycle bookkeeping shared by every game
///
/// Holds the session's identity, its status, and the message handles it
/// has bound in the registry. Games embed one and delegate the
/// identity/status parts of [`GameSession`] to it.
pub struct SessionCore {
    id: SessionId,
    game: &'static str,
    participants: Vec<Participant>,
    identity: ParticipantIdentity,
    status: AtomicU8,
    messages: Mutex<Vec<MessageHandle>>,
    ctx: Arc<AppContext>,
    me: Weak<dyn GameSession>,
}

/// Check the participant count against a game's limits
///
/// Returns the identity the session will be registered under.
pub fn check_players(
    participants: &[Participant],
    min: usize,
    max: Option<usize>,
) -> Result<ParticipantIdentity, ConfigError> {
    if participants.len() < min {
        return Err(ConfigError::NotEnoughPlayers);
    }

    if let Some(max) = max {
        if participants.len() > max {
            return Err(ConfigError::TooManyPlayers { max });
        }
    }

    ParticipantIdentity::from_participants(participants)
        .map_err(|_| ConfigError::NotEnoughPlayers)
}

impl SessionCore {
    /// `me` must point at the session embedding this core; build it with
    /// [`Arc::new_cyclic`].
    pub fn new(
        ctx: Arc<AppContext>,
        game: &'static str,
        participants: Vec<Participant>,
        identity: ParticipantIdentity,
        me: Weak<dyn GameSession>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            game,
            participants,
            identity,
            status: AtomicU8::new(SessionStatus::Created.as_u8()),
            messages: Mutex::new(Vec::new()),
            ctx,
            me,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn game(&self) -> &'static str {
        self.game
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn identity(&self) -> &ParticipantIdentity {
        &self.identity
    }

    pub fn ctx(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn is_active(&self) -> bool {
        self.status() == SessionStatus::Active
    }

    /// `Created -> Active`; false if the session was not freshly created
    pub fn activate(&self) -> bool {
        self.status
            .compare_exchange(
                SessionStatus::Created.as_u8(),
                SessionStatus::Active.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Move to `Ended`; true only for the call that made the transition
    pub fn mark_ended(&self) -> bool {
        let previous = self
            .status
            .swap(SessionStatus::Ended.as_u8(), Ordering::SeqCst);
        previous != SessionStatus::Ended.as_u8()
    }

    /// Route events on `message` to this session
    pub fn bind_message(&self, message: MessageHandle) {
        let Some(me) = self.me.upgrade() else {
            return;
        };

        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        self.ctx.registry.bind_message(message, me);
    }

    pub fn messages(&self) -> Vec<MessageHandle> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Unbind every owned message and release the registry entry
    ///
    /// Call once, from teardown, after [`SessionCore::mark_ended`] returned true.
    pub fn release(&self) {
        let messages = std::mem::take(
            &mut *self
                .messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for message in messages {
            self.ctx.registry.unbind_message(message);
        }

        let released = match self.me.upgrade() {
            Some(me) => self.ctx.registry.release_session(me.as_ref()),
            None => false,
        };
        debug!(session_id = %self.id, game = self.game, released, "Session released");
    }
}

impl std::fmt::Debug for SessionCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCore")
            .field("id", &self.id)
            .field("game", &self.game)
            .field("identity", &self.identity)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
