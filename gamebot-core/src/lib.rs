pub mod application;
pub mod domain;
pub mod games;
pub mod infrastructure;
pub mod traits;

pub use application::{
    AppConfig, AppContext, CommandError, CommandHandler, DispatchOutcome, EventDispatcher,
    GameCatalog, NotifierConfig, NotifierPolicy, SessionRegistry, ShutdownReport, TurnNotifier,
};
pub use domain::{
    Interaction, InteractionKind, MessageHandle, Participant, ParticipantError, ParticipantId,
    ParticipantIdentity, SessionEvent, SessionId, SessionStatus,
};
pub use infrastructure::{MemoryPreferences, MemoryTransport, TransportOp};
pub use traits::{
    ConfigError, GameSession, PreferenceStore, SessionError, SharedSession, Transport,
    TransportError,
};
