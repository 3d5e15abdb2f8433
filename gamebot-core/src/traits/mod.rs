pub mod game_session;
pub mod preferences;
pub mod transport;

pub use game_session::{ConfigError, GameSession, SessionError, SharedSession};
pub use preferences::{AppPreferences, PreferenceKey, PreferenceStore, GLOBAL_APP};
pub use transport::{Transport, TransportError};
