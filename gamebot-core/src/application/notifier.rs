use crate::application::{NotifierConfig, NotifierPolicy};
use crate::domain::MessageHandle;
use crate::traits::Transport;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Default)]
struct NotifierState {
    /// Text of the latest accepted `post`
    last_content: Option<String>,
    /// Live notification message, if any
    message: Option<MessageHandle>,
    /// The single pending debounce timer
    pending: Option<JoinHandle<()>>,
    /// Bumped whenever the pending timer is superseded
    generation: u64,
    closed: bool,
}

impl NotifierState {
    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

/// Debounced single-slot "your turn" message
///
/// Bursts of `post` calls collapse into one visible update. At most one
/// timer is pending at any time, and none fires after [`TurnNotifier::cleanup`].
pub struct TurnNotifier {
    transport: Arc<dyn Transport>,
    config: NotifierConfig,
    state: Arc<Mutex<NotifierState>>,
}

impl TurnNotifier {
    pub fn new(transport: Arc<dyn Transport>, config: NotifierConfig) -> Self {
        Self {
            transport,
            config,
            state: Arc::new(Mutex::new(NotifierState::default())),
        }
    }

    pub fn policy(&self) -> NotifierPolicy {
        self.config.policy
    }

    /// Show `text` as the current notification
    ///
    /// Transport failures are logged and recovered from, never returned.
    pub async fn post(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.state.lock().await;

        if state.closed {
            debug!("Notifier closed, dropping post");
            return;
        }

        match self.config.policy {
            NotifierPolicy::EditOrResend => self.edit_or_resend(&mut state, text).await,
            NotifierPolicy::DedupResend => self.dedup_resend(&mut state, text),
        }
    }

    async fn edit_or_resend(&self, state: &mut NotifierState, text: String) {
        state.last_content = Some(text.clone());

        if let Some(message) = state.message {
            match self.transport.edit(message, &text).await {
                Ok(()) => {
                    self.schedule(state);
                    return;
                }
                Err(e) if e.is_gone() => {
                    debug!(%message, "Notification gone, sending a fresh one");
                }
                Err(e) => {
                    warn!(%message, error = %e, "Failed to edit notification, resending");
                    if let Err(e) = self.transport.delete(message).await {
                        warn!(%message, error = %e, "Failed to delete old notification");
                    }
                }
            }
        }

        // A fresh message supersedes any scheduled resend
        state.cancel_pending();
        state.message = None;

        match self.transport.send(&text).await {
            Ok(message) => state.message = Some(message),
            Err(e) => warn!(error = %e, "Failed to send notification"),
        }
    }

    fn dedup_resend(&self, state: &mut NotifierState, text: String) {
        if state.last_content.as_deref() == Some(text.as_str()) {
            return;
        }

        state.last_content = Some(text);
        self.schedule(state);
    }

    /// Replace the pending timer with one that resends the latest text
    /// after the quiet interval
    fn schedule(&self, state: &mut NotifierState) {
        state.cancel_pending();

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let transport = Arc::clone(&self.transport);
        let quiet = self.config.quiet_interval;

        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;

            let mut state = shared.lock().await;
            if state.closed || state.generation != generation {
                return;
            }
            state.pending = None;

            let Some(text) = state.last_content.clone() else {
                return;
            };

            if let Some(previous) = state.message.take() {
                if let Err(e) = transport.delete(previous).await {
                    warn!(message = %previous, error = %e, "Failed to delete old notification");
                }
            }

            match transport.send(&text).await {
                Ok(message) => {
                    debug!(%message, "Notification resent");
                    state.message = Some(message);
                }
                Err(e) => warn!(error = %e, "Failed to resend notification"),
            }
        }));
    }

    /// Cancel the pending timer and delete the live message
    ///
    /// Later `post` calls are ignored.
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;

        state.closed = true;
        state.cancel_pending();
        state.last_content = None;

        if let Some(message) = state.message.take() {
            if let Err(e) = self.transport.delete(message).await {
                warn!(%message, error = %e, "Failed to delete notification");
            }
        }
    }

    /// Handle of the live notification message
    pub async fn message(&self) -> Option<MessageHandle> {
        self.state.lock().await.message
    }

    pub async fn has_pending(&self) -> bool {
        self.state
            .lock()
            .await
            .pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl Drop for TurnNotifier {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            state.closed = true;
            state.cancel_pending();
        }
    }
}

impl std::fmt::Debug for TurnNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnNotifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
