pub mod events;
pub mod message;
pub mod participant;
pub mod session;

pub use events::{Interaction, InteractionKind, SessionEvent};
pub use message::MessageHandle;
pub use participant::{Participant, ParticipantError, ParticipantId, ParticipantIdentity};
pub use session::{SessionId, SessionStatus};
