use crate::application::directory::ParticipantDirectory;
use crate::application::input::{self, ConsoleInput, InputError, HELP};
use crate::infrastructure::{ConsoleTransport, Result};
use gamebot_core::{
    AppConfig, AppContext, CommandError, CommandHandler, DispatchOutcome, EventDispatcher,
    GameCatalog, GameSession, Interaction, MemoryPreferences, MessageHandle, ParticipantError,
    ShutdownReport, Transport,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Whether the console loop keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Anything that turns into a reply instead of stopping the console
#[derive(Debug, thiserror::Error)]
enum ReplyError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Participant(#[from] ParticipantError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("There is no message {0}")]
    NoSuchMessage(MessageHandle),
}

/// Console front-end: reads command lines and plays the transport role
pub struct ConsoleRuntime {
    commands: CommandHandler,
    transport: Arc<ConsoleTransport>,
    directory: ParticipantDirectory,
}

impl ConsoleRuntime {
    pub fn new(config: AppConfig, transport: Arc<ConsoleTransport>) -> Result<Self> {
        let ctx = Arc::new(AppContext::new(
            config,
            transport.clone(),
            Arc::new(MemoryPreferences::new()),
            GameCatalog::bundled(),
        )?);
        let dispatcher = Arc::new(EventDispatcher::new(ctx.clone()));
        let directory = ParticipantDirectory::new(ctx.bot());

        Ok(Self {
            commands: CommandHandler::new(ctx, dispatcher),
            transport,
            directory,
        })
    }

    pub fn context(&self) -> &Arc<AppContext> {
        self.commands.context()
    }

    /// Read stdin until EOF, `quit` or Ctrl+C, then end every session
    pub async fn run(mut self) -> Result<ShutdownReport> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!("🎲 Console ready, type `help` for commands");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Input closed");
                        break;
                    };
                    if self.execute_line(&line).await == Flow::Quit {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down...");
                    break;
                }
            }
        }

        Ok(self.shutdown().await)
    }

    pub async fn execute_line(&mut self, line: &str) -> Flow {
        match input::parse(line) {
            Ok(Some(input)) => self.execute(input).await,
            Ok(None) => Flow::Continue,
            Err(e) => {
                self.reply(&e.to_string()).await;
                Flow::Continue
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&mut self, input: ConsoleInput) -> Flow {
        if input == ConsoleInput::Quit {
            return Flow::Quit;
        }

        match self.respond(input).await {
            Ok(Some(reply)) => self.reply(&reply).await,
            Ok(None) => {}
            Err(e) => self.reply(&e.to_string()).await,
        }
        Flow::Continue
    }

    async fn respond(&mut self, input: ConsoleInput) -> std::result::Result<Option<String>, ReplyError> {
        let reply = match input {
            ConsoleInput::Play {
                author,
                game,
                mentions,
            } => {
                let author = self.directory.resolve(&author)?;
                let mentions = self.directory.resolve_all(&mentions)?;
                let session = self.commands.start_session(&game, &author, &mentions).await?;
                debug!(session_id = %session.id(), "Session started from console");
                None
            }
            ConsoleInput::End { author, mentions } => {
                let author = self.directory.resolve(&author)?;
                let mentions = self.directory.resolve_all(&mentions)?;
                Some(self.commands.end_session(&author, &mentions).await?)
            }
            ConsoleInput::Prefs { author, app, key } => {
                let author = self.directory.resolve(&author)?;
                Some(
                    self.commands
                        .preferences(&author, app.as_deref(), key.as_deref())?,
                )
            }
            ConsoleInput::Set {
                author,
                app,
                key,
                value,
            } => {
                let author = self.directory.resolve(&author)?;
                Some(
                    self.commands
                        .set_preference(&author, app.as_deref(), key.as_deref(), value.as_deref())
                        .await?,
                )
            }
            ConsoleInput::React {
                author,
                message,
                symbol,
            } => {
                let author = self.directory.resolve(&author)?;
                self.transport
                    .store()
                    .react(message, &symbol, author.id())
                    .map_err(|_| ReplyError::NoSuchMessage(message))?;

                let outcome = self
                    .commands
                    .dispatcher()
                    .dispatch_and_wait(Interaction::reaction(author, message, symbol))
                    .await;
                debug!(?outcome, %message, "Reaction routed");
                (outcome == DispatchOutcome::Rejected)
                    .then(|| "That game isn't yours to play!".to_string())
            }
            ConsoleInput::Games => Some(self.commands.games()),
            ConsoleInput::Status => Some(serde_json::to_string_pretty(
                &self.context().registry.snapshot(),
            )?),
            ConsoleInput::Help => Some(HELP.to_string()),
            ConsoleInput::Quit => None,
        };
        Ok(reply)
    }

    async fn reply(&self, text: &str) {
        if let Err(e) = self.transport.send(text).await {
            warn!(error = %e, "Failed to post reply");
        }
    }

    /// End every live session and log the outcome
    pub async fn shutdown(&self) -> ShutdownReport {
        let report = self.context().registry.shutdown_all().await;
        self.commands.dispatcher().close_all();

        if report.is_clean() {
            info!(ended = report.ended.len(), "✅ All sessions ended");
        } else {
            for failure in &report.failures {
                warn!(
                    session_id = %failure.session_id,
                    reason = %failure.reason,
                    "⚠️  Session did not end cleanly"
                );
            }
        }
        report
    }
}
