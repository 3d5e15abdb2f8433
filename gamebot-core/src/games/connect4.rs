use crate::application::{check_players, AppContext, SessionCore, TurnNotifier};
use crate::domain::{MessageHandle, Participant, ParticipantId, ParticipantIdentity, SessionEvent, SessionId, SessionStatus};
use crate::games::{consume_marker, ignore_gone, GAME_OVER};
use crate::traits::{ConfigError, GameSession, PreferenceKey, SessionError, SharedSession};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const NAME: &str = "connect4";

pub const WIDTH: usize = 7;
pub const HEIGHT: usize = 6;

pub const COLUMN_CONTROLS: [&str; WIDTH] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣"];
const WINNER_ROW: [&str; WIDTH] = ["🎉", "🇺", "🎊", "🇼", "🇴", "🇳", "🍾"];

pub const PREFERENCES: &[PreferenceKey] = &[
    PreferenceKey::new("emoji", "Game board emoji"),
    PreferenceKey::new("color", "Message embed color"),
];

const BLANK_TILE: &str = "➕";
const DEFAULT_TILES: [&str; 2] = ["🟠", "🔵"];
const DEFAULT_COLORS: [&str; 2] = ["#ffaf2c", "#54aeef"];

pub const COLUMN_FULL: &str = "That column is full, pick another one!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(usize),
    Draw,
}

/// Rows top to bottom, discs fall toward `HEIGHT - 1`
#[derive(Debug, Default)]
struct Grid {
    cells: [[Option<usize>; WIDTH]; HEIGHT],
}

impl Grid {
    /// Drop a disc; returns the row it landed on
    fn drop_disc(&mut self, col: usize, player: usize) -> Option<usize> {
        let row = (0..HEIGHT).rev().find(|&row| self.cells[row][col].is_none())?;
        self.cells[row][col] = Some(player);
        Some(row)
    }

    fn open_columns(&self) -> Vec<usize> {
        (0..WIDTH).filter(|&col| self.cells[0][col].is_none()).collect()
    }

    fn is_full(&self) -> bool {
        self.open_columns().is_empty()
    }

    /// Four in a row through `(row, col)` for its owner
    fn wins_at(&self, row: usize, col: usize) -> bool {
        let Some(player) = self.cells[row][col] else {
            return false;
        };

        let owned = |r: isize, c: isize| {
            r >= 0
                && c >= 0
                && (r as usize) < HEIGHT
                && (c as usize) < WIDTH
                && self.cells[r as usize][c as usize] == Some(player)
        };

        [(0, 1), (1, 0), (1, 1), (1, -1)].iter().any(|&(dr, dc)| {
            let count_from = |sign: isize| {
                (1..4)
                    .take_while(|&step| {
                        owned(row as isize + dr * step * sign, col as isize + dc * step * sign)
                    })
                    .count()
            };
            1 + count_from(1) + count_from(-1) >= 4
        })
    }
}

#[derive(Debug)]
struct Connect4State {
    grid: Grid,
    current: usize,
    status: Option<String>,
    outcome: Option<Outcome>,
    board_message: Option<MessageHandle>,
}

/// Two-player four-in-a-row on a 7×6 grid
///
/// Participants drop discs with the [`COLUMN_CONTROLS`] markers. Tiles and
/// the accent colour follow each player's `emoji` and `color` preferences,
/// and the board is redrawn when either player changes them.
pub struct Connect4 {
    core: SessionCore,
    notifier: TurnNotifier,
    state: Mutex<Connect4State>,
}

impl Connect4 {
    pub fn create(
        ctx: Arc<AppContext>,
        players: Vec<Participant>,
    ) -> Result<SharedSession, ConfigError> {
        let session: SharedSession = Self::build(ctx, players, None)?;
        Ok(session)
    }

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

        // A human always opens against the bot
        let bot_seat = players.iter().position(|p| ctx.is_bot(p.id()));
        let current = match (first, bot_seat) {
            (Some(id), _) => players
                .iter()
                .position(|p| p.id() == id)
                .ok_or_else(|| ConfigError::Invalid("The first player must be in the game.".to_string()))?,
            (None, Some(bot)) => 1 - bot,
            (None, None) => ctx.with_rng(|rng| rng.gen_range(0..players.len())),
        };

        let notifier = ctx.turn_notifier();
        Ok(Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn GameSession> = me.clone();
            Self {
                core: SessionCore::new(ctx, NAME, players, identity, me),
                notifier,
                state: Mutex::new(Connect4State {
                    grid: Grid::default(),
                    current,
                    status: None,
                    outcome: None,
                    board_message: None,
                }),
            }
        }))
    }

    pub async fn board_message(&self) -> Option<MessageHandle> {
        self.state.lock().await.board_message
    }

    pub async fn current_player(&self) -> ParticipantId {
        let state = self.state.lock().await;
        self.core.participants()[state.current].id()
    }

    pub async fn outcome(&self) -> Option<Outcome> {
        self.state.lock().await.outcome
    }

    fn preference(&self, seat: usize, key: &str, default: &str) -> String {
        let player = self.core.participants()[seat].id();
        self.core.ctx().preference_or(player, NAME, key, default)
    }

    fn is_bot_turn(&self, state: &Connect4State) -> bool {
        let current = &self.core.participants()[state.current];
        self.core.ctx().is_bot(current.id())
    }

    /// Drop for the current player and advance the turn
    fn play(&self, state: &mut Connect4State, col: usize) -> bool {
        let player = state.current;
        let Some(row) = state.grid.drop_disc(col, player) else {
            return false;
        };

        if state.grid.wins_at(row, col) {
            state.outcome = Some(Outcome::Winner(player));
        } else if state.grid.is_full() {
            state.outcome = Some(Outcome::Draw);
        } else {
            state.current = 1 - player;
        }
        true
    }

    fn play_bot_move(&self, state: &mut Connect4State) {
        let columns = state.grid.open_columns();
        if let Some(col) = self.core.ctx().with_rng(|rng| columns.choose(rng).copied()) {
            debug!(session_id = %self.core.id(), col, "Bot move");
            self.play(state, col);
        }
    }

    fn turn_text(&self, state: &Connect4State) -> String {
        format!(
            "{} It's your turn in connect 4!",
            self.core.participants()[state.current].mention()
        )
    }

    fn render(&self, state: &Connect4State) -> String {
        let players = self.core.participants();
        let tiles = [
            self.preference(0, "emoji", DEFAULT_TILES[0]),
            self.preference(1, "emoji", DEFAULT_TILES[1]),
        ];
        let accent = self.preference(state.current, "color", DEFAULT_COLORS[state.current]);

        let header = match state.outcome {
            Some(Outcome::Winner(seat)) => format!("Congratulations, {}", players[seat].name()),
            Some(Outcome::Draw) => "The board is full, it's a draw!".to_string(),
            None => format!("It's your move, {}", players[state.current].name()),
        };

        let mut out = format!(
            "{} ⚔️ {}\n[{}] **{}**\n",
            players[0].mention(),
            players[1].mention(),
            accent,
            header
        );
        if let Some(status) = &state.status {
            out.push_str(status);
            out.push('\n');
        }
        out.push('\n');

        for row in &state.grid.cells {
            let line: Vec<&str> = row
                .iter()
                .map(|cell| cell.map_or(BLANK_TILE, |seat| tiles[seat].as_str()))
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }

        let footer = if state.outcome.is_some() {
            WINNER_ROW
        } else {
            COLUMN_CONTROLS
        };
        out.push_str(&footer.join(" "));

        if self.core.status() == SessionStatus::Ended {
            out.push_str("\n\n");
            out.push_str(GAME_OVER);
        }
        out
    }

    async fn refresh(&self, state: &Connect4State) -> Result<(), SessionError> {
        if let Some(message) = state.board_message {
            self.core
                .ctx()
                .transport
                .edit(message, &self.render(state))
                .await?;
        }
        Ok(())
    }

    async fn finish(&self, state: &mut Connect4State) -> Result<(), SessionError> {
        if !self.core.mark_ended() {
            return Ok(());
        }

        self.notifier.cleanup().await;
        state.status = None;

        let result = match state.board_message {
            Some(message) => {
                let transport = &self.core.ctx().transport;
                match ignore_gone(transport.clear_markers(message).await) {
                    Ok(()) => ignore_gone(transport.edit(message, &self.render(state)).await)
                        .map_err(SessionError::from),
                    Err(e) => Err(e.into()),
                }
            }
            None => Ok(()),
        };
        self.core.release();

        info!(session_id = %self.core.id(), outcome = ?state.outcome, "🏁 Connect 4 ended");
        result
    }
}

#[async_trait]
impl GameSession for Connect4 {
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

        let transport = &self.core.ctx().transport;
        let message = transport.send(&self.render(&state)).await?;
        state.board_message = Some(message);
        self.core.bind_message(message);

        for symbol in COLUMN_CONTROLS {
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

        match event {
            SessionEvent::ReactionAdded {
                participant,
                symbol,
                message,
            } => {
                consume_marker(
                    self.core.ctx().transport.as_ref(),
                    message,
                    &symbol,
                    participant.id(),
                )
                .await;

                let Some(col) = COLUMN_CONTROLS.iter().position(|s| *s == symbol) else {
                    return Ok(());
                };
                if participant.id() != self.core.participants()[state.current].id() {
                    debug!(participant = %participant, "Not this participant's turn");
                    return Ok(());
                }

                if !self.play(&mut state, col) {
                    state.status = Some(COLUMN_FULL.to_string());
                    return self.refresh(&state).await;
                }
                state.status = None;

                if state.outcome.is_none() && self.is_bot_turn(&state) {
                    self.play_bot_move(&mut state);
                }

                if state.outcome.is_some() {
                    return self.finish(&mut state).await;
                }

                self.refresh(&state).await?;
                self.notifier.post(self.turn_text(&state)).await;
                Ok(())
            }
            SessionEvent::PreferenceChanged { participant } => {
                if self.core.identity().contains(participant) {
                    self.refresh(&state).await?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn end(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        self.finish(&mut state).await
    }
}
