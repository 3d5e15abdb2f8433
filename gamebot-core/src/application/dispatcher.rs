use crate::application::AppContext;
use crate::domain::{Interaction, InteractionKind, SessionEvent, SessionId, SessionStatus};
use crate::traits::SharedSession;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// What happened to one interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Bot-authored, unroutable, or no session wanted it
    Ignored,
    /// Marker from someone outside the owning session; it was removed
    Rejected,
    /// Queued for this many sessions
    Delivered(usize),
}

struct Envelope {
    event: SessionEvent,
    ack: Option<oneshot::Sender<()>>,
}

type Mailboxes = Arc<Mutex<HashMap<SessionId, mpsc::UnboundedSender<Envelope>>>>;

/// Routes platform interactions to the sessions that own them
///
/// Every session gets one mailbox and one worker task, so its events are
/// handled one at a time in arrival order while different sessions run
/// side by side.
pub struct EventDispatcher {
    ctx: Arc<AppContext>,
    mailboxes: Mailboxes,
}

impl EventDispatcher {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            mailboxes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Route an interaction without waiting for the sessions to handle it
    pub async fn dispatch(&self, interaction: Interaction) -> DispatchOutcome {
        self.route(interaction, false).await.0
    }

    /// Route an interaction and wait until every target session handled it
    pub async fn dispatch_and_wait(&self, interaction: Interaction) -> DispatchOutcome {
        let (outcome, acks) = self.route(interaction, true).await;
        for ack in acks {
            let _ = ack.await;
        }
        outcome
    }

    /// Number of sessions with a live worker
    pub fn active_mailboxes(&self) -> usize {
        self.mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop the mailbox of a session that was ended from outside
    ///
    /// Its worker handles whatever is still queued, then stops. Returns
    /// whether a mailbox was open.
    pub fn close(&self, session: SessionId) -> bool {
        let closed = self
            .mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session)
            .is_some();
        if closed {
            debug!(session_id = %session, "Session mailbox closed");
        }
        closed
    }

    /// Drop every mailbox, returning how many were open
    pub fn close_all(&self) -> usize {
        let closed: Vec<SessionId> = self
            .mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(id, _)| id)
            .collect();
        debug!(count = closed.len(), "All session mailboxes closed");
        closed.len()
    }

    #[tracing::instrument(
        skip(self, interaction, wait),
        fields(kind = %interaction.kind, participant = %interaction.participant)
    )]
    async fn route(
        &self,
        interaction: Interaction,
        wait: bool,
    ) -> (DispatchOutcome, Vec<oneshot::Receiver<()>>) {
        let Interaction {
            kind,
            participant,
            symbol,
            message,
        } = interaction;

        if self.ctx.is_bot(participant.id()) {
            return (DispatchOutcome::Ignored, Vec::new());
        }

        let targets: Vec<(SharedSession, SessionEvent)> = match kind {
            InteractionKind::ReactionAdded => {
                let (Some(message), Some(symbol)) = (message, symbol) else {
                    debug!("Reaction without message or symbol");
                    return (DispatchOutcome::Ignored, Vec::new());
                };
                let Some(session) = self.ctx.registry.session_for_message(message) else {
                    return (DispatchOutcome::Ignored, Vec::new());
                };

                if !session.identity().contains(participant.id()) {
                    debug!(session_id = %session.id(), "Marker from outside the session, removing");
                    if let Err(e) = self
                        .ctx
                        .transport
                        .remove_marker(message, &symbol, participant.id())
                        .await
                    {
                        warn!(%message, error = %e, "Failed to remove marker");
                    }
                    return (DispatchOutcome::Rejected, Vec::new());
                }

                vec![(
                    session,
                    SessionEvent::ReactionAdded {
                        participant,
                        symbol,
                        message,
                    },
                )]
            }
            InteractionKind::PreferenceChanged => self
                .ctx
                .registry
                .sessions_for(participant.id())
                .into_iter()
                .map(|session| {
                    (
                        session,
                        SessionEvent::PreferenceChanged {
                            participant: participant.id(),
                        },
                    )
                })
                .collect(),
            InteractionKind::Other(kind) => {
                let Some(session) = message.and_then(|m| self.ctx.registry.session_for_message(m))
                else {
                    return (DispatchOutcome::Ignored, Vec::new());
                };
                vec![(session, SessionEvent::Unrecognized { kind })]
            }
        };

        let mut delivered = 0;
        let mut acks = Vec::new();
        for (session, event) in targets {
            let (ack, done) = if wait {
                let (tx, rx) = oneshot::channel();
                (Some(tx), Some(rx))
            } else {
                (None, None)
            };

            if self.deliver(session, Envelope { event, ack }) {
                delivered += 1;
                acks.extend(done);
            }
        }

        let outcome = if delivered == 0 {
            DispatchOutcome::Ignored
        } else {
            DispatchOutcome::Delivered(delivered)
        };
        (outcome, acks)
    }

    fn deliver(&self, session: SharedSession, envelope: Envelope) -> bool {
        let id = session.id();
        let mut mailboxes = self.mailboxes.lock().unwrap_or_else(PoisonError::into_inner);

        let envelope = match mailboxes.get(&id) {
            Some(mailbox) => match mailbox.send(envelope) {
                Ok(()) => return true,
                Err(mpsc::error::SendError(envelope)) => {
                    mailboxes.remove(&id);
                    envelope
                }
            },
            None => envelope,
        };

        if session.status() == SessionStatus::Ended {
            return false;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(envelope).is_err() {
            return false;
        }
        mailboxes.insert(id, tx);

        debug!(session_id = %id, "Starting session worker");
        tokio::spawn(run_mailbox(session, rx, Arc::clone(&self.mailboxes)));
        true
    }
}

async fn run_mailbox(
    session: SharedSession,
    mut inbox: mpsc::UnboundedReceiver<Envelope>,
    mailboxes: Mailboxes,
) {
    while let Some(Envelope { event, ack }) = inbox.recv().await {
        let kind = event.kind().to_string();
        if let Err(e) = session.handle(event).await {
            warn!(session_id = %session.id(), kind, error = %e, "⚠️ Session failed to handle event");
        }
        if let Some(ack) = ack {
            let _ = ack.send(());
        }

        if session.status() == SessionStatus::Ended {
            break;
        }
    }

    drop(inbox);
    debug!(session_id = %session.id(), "Session worker stopped");

    // A closed sender means the entry is still ours and not a successor's
    let mut mailboxes = mailboxes.lock().unwrap_or_else(PoisonError::into_inner);
    if mailboxes
        .get(&session.id())
        .is_some_and(mpsc::UnboundedSender::is_closed)
    {
        mailboxes.remove(&session.id());
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("mailboxes", &self.active_mailboxes())
            .finish()
    }
}
