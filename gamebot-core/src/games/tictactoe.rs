use crate::application::{check_players, AppContext, SessionCore, TurnNotifier};
use crate::domain::{MessageHandle, Participant, ParticipantId, ParticipantIdentity, SessionEvent, SessionId, SessionStatus};
use crate::games::{consume_marker, ignore_gone, GAME_OVER};
use crate::traits::{ConfigError, GameSession, SessionError, SharedSession};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt::Write;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const NAME: &str = "tictactoe";

pub const ROW_CONTROLS: [&str; 3] = ["1️⃣", "2️⃣", "3️⃣"];
pub const COLUMN_CONTROLS: [&str; 3] = ["🥇", "🥈", "🥉"];

pub const TAKEN: &str = "❌ That's taken, choose another spot!";

const EMPTY: &str = "⬜";
const MARKS: [&str; 2] = ["❎", "🔵"];

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Row(usize),
    Column(usize),
}

impl Control {
    fn parse(symbol: &str) -> Option<Self> {
        if let Some(row) = ROW_CONTROLS.iter().position(|s| *s == symbol) {
            return Some(Control::Row(row));
        }
        COLUMN_CONTROLS
            .iter()
            .position(|s| *s == symbol)
            .map(Control::Column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Index into the session's participants
    Winner(usize),
    Tie,
}

#[derive(Debug, Default)]
struct Board {
    cells: [[Option<usize>; 3]; 3],
}

impl Board {
    fn place(&mut self, row: usize, col: usize, player: usize) -> bool {
        match self.cells[row][col] {
            Some(_) => false,
            None => {
                self.cells[row][col] = Some(player);
                true
            }
        }
    }

    fn empty_cells(&self) -> Vec<(usize, usize)> {
        (0..3)
            .flat_map(|row| (0..3).map(move |col| (row, col)))
            .filter(|&(row, col)| self.cells[row][col].is_none())
            .collect()
    }

    fn outcome(&self) -> Option<Outcome> {
        for line in LINES {
            let [a, b, c] = line.map(|(row, col)| self.cells[row][col]);
            if let Some(player) = a {
                if b == a && c == a {
                    return Some(Outcome::Winner(player));
                }
            }
        }

        if self.empty_cells().is_empty() {
            Some(Outcome::Tie)
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct TicTacToeState {
    board: Board,
    current: usize,
    selected_row: Option<usize>,
    selected_col: Option<usize>,
    status: Option<String>,
    outcome: Option<Outcome>,
    board_message: Option<MessageHandle>,
}

/// Two-player tic-tac-toe driven by row and column markers
///
/// A move takes two markers: one of [`ROW_CONTROLS`] and one of
/// [`COLUMN_CONTROLS`], in either order. Choosing a taken cell shows
/// [`TAKEN`] and keeps the turn.
pub struct TicTacToe {
    core: SessionCore,
    notifier: TurnNotifier,
    state: Mutex<TicTacToeState>,
}

impl TicTacToe {
    /// Catalog factory; the first player is picked at random
    pub fn create(
        ctx: Arc<AppContext>,
        players: Vec<Participant>,
    ) -> Result<SharedSession, ConfigError> {
        let session: SharedSession = Self::build(ctx, players, None)?;
        Ok(session)
    }

    /// Build a session where `first` moves first
    pub fn starting_with(
        ctx: Arc<AppContext>,
        players: Vec<Participant>,
        first: ParticipantId,
    ) -> Result<Arc<Self>, ConfigError> {
        Self::build(ctx, players, Some(first))
    }

    fn build(
        ctx: Arc<AppContext>,
        players: Vec<Participant>,
        first: Option<ParticipantId>,
    ) -> Result<Arc<Self>, ConfigError> {
        let identity = check_players(&players, 2, Some(2))?;

        let current = match first {
            Some(id) => players
                .iter()
                .position(|p| p.id() == id)
                .ok_or_else(|| ConfigError::Invalid("The first player must be in the game.".to_string()))?,
            None => ctx.with_rng(|rng| rng.gen_range(0..players.len())),
        };

        let notifier = ctx.turn_notifier();
        Ok(Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn GameSession> = me.clone();
            Self {
                core: SessionCore::new(ctx, NAME, players, identity, me),
                notifier,
                state: Mutex::new(TicTacToeState {
                    board: Board::default(),
                    current,
                    selected_row: None,
                    selected_col: None,
                    status: None,
                    outcome: None,
                    board_message: None,
                }),
            }
        }))
    }

    pub async fn current_player(&self) -> ParticipantId {
        let state = self.state.lock().await;
        self.core.participants()[state.current].id()
    }

    pub async fn board_message(&self) -> Option<MessageHandle> {
        self.state.lock().await.board_message
    }

    /// Who holds the cell at `(row, col)`, both zero-based
    pub async fn cell(&self, row: usize, col: usize) -> Option<ParticipantId> {
        let state = self.state.lock().await;
        state.board.cells[row][col].map(|i| self.core.participants()[i].id())
    }

    pub async fn status_line(&self) -> Option<String> {
        self.state.lock().await.status.clone()
    }

    pub async fn outcome(&self) -> Option<Outcome> {
        self.state.lock().await.outcome
    }

    fn is_bot_turn(&self, state: &TicTacToeState) -> bool {
        let current = &self.core.participants()[state.current];
        self.core.ctx().is_bot(current.id())
    }

    fn play_bot_move(&self, state: &mut TicTacToeState) {
        let cells = state.board.empty_cells();
        let Some((row, col)) = self.core.ctx().with_rng(|rng| cells.choose(rng).copied()) else {
            return;
        };

        debug!(session_id = %self.core.id(), row, col, "Bot move");
        state.board.place(row, col, state.current);
        state.current = 1 - state.current;
        state.outcome = state.board.outcome();
    }

    fn turn_text(&self, state: &TicTacToeState) -> String {
        format!(
            "{} it is your turn in Tic-Tac-Toe!",
            self.core.participants()[state.current].mention()
        )
    }

    fn render(&self, state: &TicTacToeState) -> String {
        let players = self.core.participants();
        let label = |i: Option<usize>, controls: &[&str; 3]| {
            i.map_or("?", |i| controls[i]).to_string()
        };

        let mut out = format!("**Tic Tac Toe: {} and {}**\n", players[0].name(), players[1].name());

        if state.outcome.is_none() {
            let _ = writeln!(
                out,
                "Selected: ({}, {})",
                label(state.selected_row, &ROW_CONTROLS),
                label(state.selected_col, &COLUMN_CONTROLS)
            );
        }
        if let Some(status) = &state.status {
            let _ = writeln!(out, "{}", status);
        }

        let _ = writeln!(out, "\n⬛ {}", COLUMN_CONTROLS.join(" "));
        for (row, cells) in state.board.cells.iter().enumerate() {
            let marks: Vec<&str> = cells
                .iter()
                .map(|cell| cell.map_or(EMPTY, |p| MARKS[p]))
                .collect();
            let _ = writeln!(out, "{} {}", ROW_CONTROLS[row], marks.join(" "));
        }
        out.push('\n');

        for (i, player) in players.iter().enumerate() {
            let _ = write!(out, "{} {}", MARKS[i], player.mention());
            if state.outcome == Some(Outcome::Winner(i)) {
                out.push_str(" **has won**!");
            }
            out.push('\n');
        }

        if state.outcome == Some(Outcome::Tie) {
            out.push_str("**It's a tie!**\n");
        }
        if self.core.status() == SessionStatus::Ended {
            let _ = write!(out, "\n{}", GAME_OVER);
        }

        out
    }

    async fn refresh(&self, state: &TicTacToeState) -> Result<(), SessionError> {
        if let Some(message) = state.board_message {
            self.core
                .ctx()
                .transport
                .edit(message, &self.render(state))
                .await?;
        }
        self.notifier.post(self.turn_text(state)).await;
        Ok(())
    }

    /// Teardown, run once under the state lock
    async fn finish(&self, state: &mut TicTacToeState) -> Result<(), SessionError> {
        if !self.core.mark_ended() {
            return Ok(());
        }

        self.notifier.cleanup().await;
        state.status = None;
        state.selected_row = None;
        state.selected_col = None;

        let result = self.close_board(state).await;
        self.core.release();

        info!(session_id = %self.core.id(), outcome = ?state.outcome, "🏁 Tic-Tac-Toe ended");
        result
    }

    async fn close_board(&self, state: &TicTacToeState) -> Result<(), SessionError> {
        let Some(message) = state.board_message else {
            return Ok(());
        };

        let transport = &self.core.ctx().transport;
        ignore_gone(transport.clear_markers(message).await)?;
        ignore_gone(transport.edit(message, &self.render(state)).await)?;
        Ok(())
    }
}

#[async_trait]
impl GameSession for TicTacToe {
    fn id(&self) -> SessionId {
        self.core.id()
    }

    fn game(&self) -> &str {
        self.core.game()
    }

    fn participants(&self) -> &[Participant] {
        self.core.participants()
    }

    fn identity(&self) -> &ParticipantIdentity {
        self.core.identity()
    }

    fn status(&self) -> SessionStatus {
        self.core.status()
    }

    async fn begin(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if self.core.status() != SessionStatus::Created {
            return Ok(());
        }

        if self.is_bot_turn(&state) {
            self.play_bot_move(&mut state);
        }

        let transport = &self.core.ctx().transport;
        let message = transport.send(&self.render(&state)).await?;
        state.board_message = Some(message);
        self.core.bind_message(message);

        for symbol in ROW_CONTROLS.iter().chain(COLUMN_CONTROLS.iter()) {
            transport.add_marker(message, symbol).await?;
        }

        self.core.activate();
        self.notifier.post(self.turn_text(&state)).await;
        Ok(())
    }

    async fn handle(&self, event: SessionEvent) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if !self.core.is_active() {
            return Ok(());
        }

        let SessionEvent::ReactionAdded {
            participant,
            symbol,
            message,
        } = event
        else {
            return Ok(());
        };

        consume_marker(
            self.core.ctx().transport.as_ref(),
            message,
            &symbol,
            participant.id(),
        )
        .await;

        let Some(control) = Control::parse(&symbol) else {
            return Ok(());
        };
        if participant.id() != self.core.participants()[state.current].id() {
            debug!(participant = %participant, "Not this participant's turn");
            return Ok(());
        }

        // A fresh selection after a rejected move starts over
        if state.status.take().is_some() {
            state.selected_row = None;
            state.selected_col = None;
        }

        match control {
            Control::Row(row) => state.selected_row = Some(row),
            Control::Column(col) => state.selected_col = Some(col),
        }

        if let (Some(row), Some(col)) = (state.selected_row, state.selected_col) {
            state.selected_row = None;
            state.selected_col = None;

            let player = state.current;
            if state.board.place(row, col, player) {
                state.current = 1 - player;
                state.outcome = state.board.outcome();
            } else {
                state.status = Some(TAKEN.to_string());
            }
        }

        if state.outcome.is_none() && self.is_bot_turn(&state) {
            self.play_bot_move(&mut state);
        }

        if state.outcome.is_some() {
            return self.finish(&mut state).await;
        }

        self.refresh(&state).await
    }

    async fn end(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        self.finish(&mut state).await
    }
}
