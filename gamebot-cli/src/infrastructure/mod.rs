pub mod console_transport;
pub mod error;
pub mod observability;

pub use console_transport::ConsoleTransport;
pub use error::{CliError, Result};
pub use observability::LogConfig;
