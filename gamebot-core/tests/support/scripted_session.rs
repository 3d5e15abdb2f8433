use async_trait::async_trait;
use gamebot_core::{
    GameSession, Participant, ParticipantIdentity, SessionError, SessionEvent, SessionId,
    SessionStatus, SharedSession, TransportError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How a [`ScriptedSession`] behaves when ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    Clean,
    Fail,
    Panic,
}

/// Session with no game logic; records what it was asked to do
pub struct ScriptedSession {
    id: SessionId,
    participants: Vec<Participant>,
    identity: ParticipantIdentity,
    teardown: Teardown,
    status: Mutex<SessionStatus>,
    handled: Mutex<Vec<SessionEvent>>,
    ends: AtomicUsize,
}

impl ScriptedSession {
    pub fn new(participants: &[&Participant], teardown: Teardown) -> Arc<Self> {
        let participants: Vec<Participant> = participants.iter().map(|p| (*p).clone()).collect();
        let identity =
            ParticipantIdentity::from_participants(&participants).expect("non-empty participants");
        Arc::new(Self {
            id: SessionId::new(),
            participants,
            identity,
            teardown,
            status: Mutex::new(SessionStatus::Active),
            handled: Mutex::new(Vec::new()),
            ends: AtomicUsize::new(0),
        })
    }

    pub fn shared(self: &Arc<Self>) -> SharedSession {
        self.clone()
    }

    pub fn handled(&self) -> Vec<SessionEvent> {
        self.handled.lock().unwrap().clone()
    }

    pub fn end_calls(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameSession for ScriptedSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn game(&self) -> &str {
        "scripted"
    }

    fn participants(&self) -> &[Participant] {
        &self.participants
    }

    fn identity(&self) -> &ParticipantIdentity {
        &self.identity
    }

    fn status(&self) -> SessionStatus {
        *self.status.lock().unwrap()
    }

    async fn begin(&self) -> Result<(), SessionError> {
        Ok(())
    }

    async fn handle(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.handled.lock().unwrap().push(event);
        Ok(())
    }

    async fn end(&self) -> Result<(), SessionError> {
        self.ends.fetch_add(1, Ordering::SeqCst);
        *self.status.lock().unwrap() = SessionStatus::Ended;
        match self.teardown {
            Teardown::Clean => Ok(()),
            Teardown::Fail => Err(TransportError::Unavailable("gateway closed".to_string()).into()),
            Teardown::Panic => panic!("teardown exploded"),
        }
    }
}
