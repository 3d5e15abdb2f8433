pub mod application;
pub mod infrastructure;

pub use application::{ConsoleRuntime, Flow, ParticipantDirectory};
pub use infrastructure::{CliError, ConsoleTransport, LogConfig, Result};
