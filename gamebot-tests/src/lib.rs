use cucumber::World;
use gamebot_core::games::TicTacToe;
use gamebot_core::{
    AppConfig, AppContext, CommandHandler, DispatchOutcome, EventDispatcher, GameCatalog,
    Interaction, MemoryPreferences, MemoryTransport, MessageHandle, NotifierConfig, Participant,
    ShutdownReport, TurnNotifier,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Quiet interval used by every scenario; short enough to wait out for real
pub const QUIET_INTERVAL: Duration = Duration::from_millis(100);

#[derive(World)]
#[world(init = Self::new)]
pub struct GameWorld {
    /// Bot wiring (the system under test)
    pub ctx: Arc<AppContext>,
    pub transport: Arc<MemoryTransport>,
    pub commands: CommandHandler,

    /// Participants by name, created on first use
    pub participants: HashMap<String, Participant>,

    /// Tic-tac-toe game driven by the turn steps
    pub game: Option<Arc<TicTacToe>>,

    /// Standalone notifier for the notifier scenarios
    pub notifier: Option<TurnNotifier>,

    pub last_reply: Option<String>,
    pub last_error: Option<String>,
    pub last_outcome: Option<DispatchOutcome>,
    pub last_report: Option<ShutdownReport>,
}

impl GameWorld {
    pub fn new() -> Self {
        let transport = Arc::new(MemoryTransport::new());
        let config = AppConfig::new()
            .with_seed(11)
            .with_notifier(NotifierConfig::new().with_quiet_interval(QUIET_INTERVAL));
        let ctx = Arc::new(
            AppContext::new(
                config,
                transport.clone(),
                Arc::new(MemoryPreferences::new()),
                GameCatalog::bundled(),
            )
            .expect("default bot name is valid"),
        );
        let dispatcher = Arc::new(EventDispatcher::new(ctx.clone()));
        let commands = CommandHandler::new(ctx.clone(), dispatcher);

        Self {
            ctx,
            transport,
            commands,
            participants: HashMap::new(),
            game: None,
            notifier: None,
            last_reply: None,
            last_error: None,
            last_outcome: None,
            last_report: None,
        }
    }

    /// Get or create a participant by name
    pub fn participant(&mut self, name: &str) -> Participant {
        self.participants
            .entry(name.to_string())
            .or_insert_with(|| Participant::new(name).expect("valid participant name"))
            .clone()
    }

    /// Get the running tic-tac-toe game (panics if none)
    pub fn game(&self) -> &Arc<TicTacToe> {
        self.game.as_ref().expect("No tic-tac-toe game started")
    }

    pub fn notifier(&self) -> &TurnNotifier {
        self.notifier.as_ref().expect("No notifier configured")
    }

    /// Store the outcome of a command
    pub fn record<T, E: std::fmt::Display>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    /// Place a marker on `message` and route it through the dispatcher
    pub async fn react(&mut self, name: &str, message: MessageHandle, symbol: &str) {
        let who = self.participant(name);
        self.transport
            .react(message, symbol, who.id())
            .expect("message should exist");
        let outcome = self
            .commands
            .dispatcher()
            .dispatch_and_wait(Interaction::reaction(who, message, symbol))
            .await;
        self.last_outcome = Some(outcome);
    }

    /// Contents of every message sent so far, in order
    pub fn notifications_sent(&self) -> Vec<String> {
        self.transport.sent_contents()
    }
}

impl std::fmt::Debug for GameWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameWorld")
            .field("registry", &self.ctx.registry)
            .field("participants", &self.participants.keys().collect::<Vec<_>>())
            .field("last_reply", &self.last_reply)
            .field("last_error", &self.last_error)
            .field("last_outcome", &self.last_outcome)
            .finish_non_exhaustive()
    }
}
