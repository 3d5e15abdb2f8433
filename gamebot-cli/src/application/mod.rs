pub mod directory;
pub mod input;
pub mod runtime;

pub use directory::ParticipantDirectory;
pub use input::{ConsoleInput, InputError, HELP};
pub use runtime::{ConsoleRuntime, Flow};
