pub mod scripted_session;

use gamebot_core::{
    AppConfig, AppContext, CommandHandler, EventDispatcher, GameCatalog, Interaction,
    MemoryPreferences, MemoryTransport, MessageHandle, NotifierConfig, Participant,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use scripted_session::{ScriptedSession, Teardown};

/// Route core logs to the test writer; set `RUST_LOG` to see them
pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

/// Test fixture wiring the core to in-memory adapters
pub struct BotFixture {
    pub ctx: Arc<AppContext>,
    pub transport: Arc<MemoryTransport>,
    pub dispatcher: Arc<EventDispatcher>,
    pub commands: CommandHandler,
}

impl BotFixture {
    pub fn new() -> Self {
        Self::with_config(
            AppConfig::new()
                .with_seed(7)
                .with_notifier(NotifierConfig::new().with_quiet_interval(Duration::from_millis(50))),
        )
    }

    pub fn with_config(config: AppConfig) -> Self {
        init_test_tracing();

        let transport = Arc::new(MemoryTransport::new());
        let ctx = Arc::new(
            AppContext::new(
                config,
                transport.clone(),
                Arc::new(MemoryPreferences::new()),
                GameCatalog::bundled(),
            )
            .expect("valid bot name"),
        );
        let dispatcher = Arc::new(EventDispatcher::new(ctx.clone()));
        let commands = CommandHandler::new(ctx.clone(), dispatcher.clone());

        Self {
            ctx,
            transport,
            dispatcher,
            commands,
        }
    }

    pub fn participant(name: &str) -> Participant {
        Participant::new(name).expect("valid participant name")
    }

    /// Put a marker on `message` as `who` and wait until the owning session
    /// has handled it
    pub async fn react(&self, who: &Participant, message: MessageHandle, symbol: &str) {
        self.transport
            .react(message, symbol, who.id())
            .expect("message should exist");
        self.dispatcher
            .dispatch_and_wait(Interaction::reaction(who.clone(), message, symbol))
            .await;
    }

    /// Markers currently placed by participants rather than the bot
    pub fn participant_markers(&self, message: MessageHandle) -> usize {
        self.transport
            .message(message)
            .map(|m| m.markers.iter().filter(|marker| marker.by.is_some()).count())
            .unwrap_or(0)
    }
}

impl Default for BotFixture {
    fn default() -> Self {
        Self::new()
    }
}
