pub mod catalog;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod lifecycle;
pub mod notifier;
pub mod registry;

pub use catalog::{GameCatalog, GameEntry, GameFactory};
pub use commands::{participants, CommandError, CommandHandler};
pub use config::{AppConfig, NotifierConfig, NotifierPolicy};
pub use context::AppContext;
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use lifecycle::{check_players, SessionCore};
pub use notifier::TurnNotifier;
pub use registry::{RegistrySnapshot, SessionRegistry, SessionSummary, ShutdownFailure, ShutdownReport};
