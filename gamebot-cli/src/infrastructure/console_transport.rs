use async_trait::async_trait;
use gamebot_core::{MemoryTransport, MessageHandle, ParticipantId, Transport, TransportError, TransportOp};
use std::sync::Arc;

/// Transport that keeps messages in memory and echoes every change to stdout
///
/// The console has no real chat channel; players read the printed
/// operations and answer with `react` lines that refer to the `#handle`.
pub struct ConsoleTransport {
    inner: Arc<MemoryTransport>,
    echo: bool,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryTransport::new()),
            echo: true,
        }
    }

    /// Keep quiet on stdout; used by tests
    pub fn silent() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    /// Underlying message store, for placing participant markers
    pub fn store(&self) -> &Arc<MemoryTransport> {
        &self.inner
    }

    fn print(&self, op: TransportOp) {
        if self.echo {
            println!("{}", describe(&op));
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// One human-readable line per operation
pub fn describe(op: &TransportOp) -> String {
    match op {
        TransportOp::Send { message, content } => {
            format!("📨 {}\n{}\n", message, indent(content))
        }
        TransportOp::Edit { message, content } => {
            format!("✏️  {}\n{}\n", message, indent(content))
        }
        TransportOp::Delete { message } => format!("🗑️  {} deleted", message),
        TransportOp::AddMarker { message, symbol } => format!("➕ {} {}", message, symbol),
        TransportOp::RemoveMarker {
            message,
            symbol,
            participant,
        } => format!("➖ {} {} (from {})", message, symbol, participant),
        TransportOp::ClearMarkers { message } => format!("🧹 {} markers cleared", message),
    }
}

fn indent(content: &str) -> String {
    content
        .lines()
        .map(|line| format!("  │ {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, content: &str) -> Result<MessageHandle, TransportError> {
        let message = self.inner.send(content).await?;
        self.print(TransportOp::Send {
            message,
            content: content.to_string(),
        });
        Ok(message)
    }

    async fn edit(&self, message: MessageHandle, content: &str) -> Result<(), TransportError> {
        self.inner.edit(message, content).await?;
        self.print(TransportOp::Edit {
            message,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, message: MessageHandle) -> Result<(), TransportError> {
        let existed = self.inner.contains(message);
        self.inner.delete(message).await?;
        if existed {
            self.print(TransportOp::Delete { message });
        }
        Ok(())
    }

    async fn add_marker(&self, message: MessageHandle, symbol: &str) -> Result<(), TransportError> {
        self.inner.add_marker(message, symbol).await?;
        self.print(TransportOp::AddMarker {
            message,
            symbol: symbol.to_string(),
        });
        Ok(())
    }

    async fn remove_marker(
        &self,
        message: MessageHandle,
        symbol: &str,
        participant: ParticipantId,
    ) -> Result<(), TransportError> {
        self.inner.remove_marker(message, symbol, participant).await?;
        self.print(TransportOp::RemoveMarker {
            message,
            symbol: symbol.to_string(),
            participant,
        });
        Ok(())
    }

    async fn clear_markers(&self, message: MessageHandle) -> Result<(), TransportError> {
        self.inner.clear_markers(message).await?;
        self.print(TransportOp::ClearMarkers { message });
        Ok(())
    }
}
