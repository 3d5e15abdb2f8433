//! Bundled turn-based games
//!
//! Each game embeds a [`SessionCore`](crate::application::SessionCore) for
//! lifecycle bookkeeping and keeps its mutable state behind a
//! `tokio::sync::Mutex`, so `handle` and `end` never interleave.

pub mod connect4;
pub mod game2048;
pub mod tictactoe;

pub use connect4::Connect4;
pub use game2048::Game2048;
pub use tictactoe::TicTacToe;

use crate::domain::{MessageHandle, ParticipantId};
use crate::traits::{Transport, TransportError};
use tracing::warn;

/// "GAME OVER" spelled in regional indicator symbols
pub const GAME_OVER: &str = "🇬 🇦 🇲 🇪 ▫️ 🇴 🇻 🇪 🇷";

/// Take a participant's marker back off a board after reading it
pub(crate) async fn consume_marker(
    transport: &dyn Transport,
    message: MessageHandle,
    symbol: &str,
    participant: ParticipantId,
) {
    if let Err(e) = transport.remove_marker(message, symbol, participant).await {
        warn!(%message, symbol, error = %e, "Failed to remove marker");
    }
}

/// Treat a vanished message as already cleaned up
pub(crate) fn ignore_gone(result: Result<(), TransportError>) -> Result<(), TransportError> {
    match result {
        Err(e) if e.is_gone() => Ok(()),
        other => other,
    }
}
