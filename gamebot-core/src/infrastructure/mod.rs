pub mod memory_preferences;
pub mod memory_transport;

pub use memory_preferences::MemoryPreferences;
pub use memory_transport::{Marker, MemoryTransport, StoredMessage, TransportOp};
