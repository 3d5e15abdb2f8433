use crate::application::{check_players, AppContext, SessionCore};
use crate::domain::{MessageHandle, Participant, ParticipantId, ParticipantIdentity, SessionEvent, SessionId, SessionStatus};
use crate::games::{consume_marker, ignore_gone, GAME_OVER};
use crate::traits::{ConfigError, GameSession, SessionError, SharedSession, TransportError};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const NAME: &str = "2048";

const SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
    /// Fill every empty cell
    Fill,
}

pub const CONTROLS: [(&str, Move); 5] = [
    ("⬅️", Move::Left),
    ("➡️", Move::Right),
    ("⬆️", Move::Up),
    ("⬇️", Move::Down),
    ("🔥", Move::Fill),
];

impl Move {
    pub fn parse(symbol: &str) -> Option<Self> {
        CONTROLS
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, m)| *m)
    }
}

/// A 4×4 sliding-tile board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[u32; SIZE]; SIZE],
    score: u32,
}

/// Slide one line toward index 0, merging equal neighbours once
fn slide_line(line: [u32; SIZE]) -> ([u32; SIZE], u32) {
    let tiles: Vec<u32> = line.into_iter().filter(|&v| v != 0).collect();
    let mut out = [0; SIZE];
    let mut gained = 0;
    let mut write = 0;
    let mut i = 0;

    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            out[write] = tiles[i] * 2;
            gained += tiles[i] * 2;
            i += 2;
        } else {
            out[write] = tiles[i];
            i += 1;
        }
        write += 1;
    }

    (out, gained)
}

impl Board {
    pub fn from_cells(cells: [[u32; SIZE]; SIZE]) -> Self {
        Self { cells, score: 0 }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn cells(&self) -> &[[u32; SIZE]; SIZE] {
        &self.cells
    }

    fn empty_cells(&self) -> Vec<(usize, usize)> {
        (0..SIZE)
            .flat_map(|row| (0..SIZE).map(move |col| (row, col)))
            .filter(|&(row, col)| self.cells[row][col] == 0)
            .collect()
    }

    /// Coordinates of line `i`, ordered in the direction tiles travel
    fn line_coords(direction: Move, i: usize) -> [(usize, usize); SIZE] {
        std::array::from_fn(|j| match direction {
            Move::Left => (i, j),
            Move::Right => (i, SIZE - 1 - j),
            Move::Up => (j, i),
            Move::Down => (SIZE - 1 - j, i),
            Move::Fill => (i, j),
        })
    }

    /// Slide every line; returns whether anything moved
    pub fn shift(&mut self, direction: Move) -> bool {
        let mut moved = false;

        for i in 0..SIZE {
            let coords = Self::line_coords(direction, i);
            let line = coords.map(|(row, col)| self.cells[row][col]);
            let (slid, gained) = slide_line(line);

            if slid != line {
                moved = true;
                for ((row, col), value) in coords.into_iter().zip(slid) {
                    self.cells[row][col] = value;
                }
            }
            self.score += gained;
        }

        moved
    }

    /// No empty cell and no neighbouring pair that could merge
    pub fn is_stuck(&self) -> bool {
        if !self.empty_cells().is_empty() {
            return false;
        }

        for row in 0..SIZE {
            for col in 0..SIZE {
                let value = self.cells[row][col];
                if col + 1 < SIZE && self.cells[row][col + 1] == value {
                    return false;
                }
                if row + 1 < SIZE && self.cells[row + 1][col] == value {
                    return false;
                }
            }
        }
        true
    }

    /// Place a 2 (twice as likely) or a 4 on a random empty cell
    fn insert_random(&mut self, rng: &mut impl Rng) -> bool {
        let Some(&(row, col)) = self.empty_cells().choose(rng) else {
            return false;
        };
        self.cells[row][col] = *[2, 2, 4].choose(rng).unwrap_or(&2);
        true
    }

    fn render(&self) -> String {
        let mut out = format!("Score: {}\n", self.score);
        for row in &self.cells {
            let line: Vec<String> = row
                .iter()
                .map(|&v| match v {
                    0 => "⬜".to_string(),
                    2 => "2️⃣".to_string(),
                    4 => "4️⃣".to_string(),
                    8 => "8️⃣".to_string(),
                    v => format!("`{}`", v),
                })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

#[derive(Debug)]
struct PlayerBoard {
    player: Participant,
    board: Board,
    message: Option<MessageHandle>,
    finished: bool,
}

impl PlayerBoard {
    fn render(&self) -> String {
        let mut out = format!("**Play 2048: {}**\n", self.player.name());
        out.push_str(&self.board.render());
        out.push_str(&self.player.mention());
        if self.finished {
            out.push_str("\n\n");
            out.push_str(GAME_OVER);
        }
        out
    }
}

#[derive(Debug, Default)]
struct Game2048State {
    boards: BTreeMap<ParticipantId, PlayerBoard>,
    winner: Option<(ParticipantId, u32)>,
}

/// 2048 for any number of players, one board per player
///
/// The session ends for everyone as soon as one board has no moves left;
/// with more than one player the best score is announced.
pub struct Game2048 {
    core: SessionCore,
    state: Mutex<Game2048State>,
}

impl Game2048 {
    pub fn create(
        ctx: Arc<AppContext>,
        players: Vec<Participant>,
    ) -> Result<SharedSession, ConfigError> {
        let session: SharedSession = Self::build(ctx, players)?;
        Ok(session)
    }

    pub fn build(ctx: Arc<AppContext>, players: Vec<Participant>) -> Result<Arc<Self>, ConfigError> {
        let identity = check_players(&players, 1, None)?;
        if players.iter().any(|p| ctx.is_bot(p.id())) {
            return Err(ConfigError::Invalid(format!(
                "{} doesn't play 2048, pick a human opponent!",
                ctx.bot().name()
            )));
        }

        let boards = players
            .iter()
            .map(|p| {
                (
                    p.id(),
                    PlayerBoard {
                        player: p.clone(),
                        board: Board::default(),
                        message: None,
                        finished: false,
                    },
                )
            })
            .collect();

        Ok(Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn GameSession> = me.clone();
            Self {
                core: SessionCore::new(ctx, NAME, players, identity, me),
                state: Mutex::new(Game2048State {
                    boards,
                    winner: None,
                }),
            }
        }))
    }

    pub async fn board_message(&self, player: ParticipantId) -> Option<MessageHandle> {
        let state = self.state.lock().await;
        state.boards.get(&player).and_then(|b| b.message)
    }

    pub async fn board(&self, player: ParticipantId) -> Option<Board> {
        let state = self.state.lock().await;
        state.boards.get(&player).map(|b| b.board.clone())
    }

    /// Replace a player's board, e.g. to set up a position
    pub async fn set_board(&self, player: ParticipantId, board: Board) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        let Some(entry) = state.boards.get_mut(&player) else {
            return Ok(());
        };
        entry.board = board;

        if let Some(message) = entry.message {
            self.core
                .ctx()
                .transport
                .edit(message, &entry.render())
                .await?;
        }
        Ok(())
    }

    pub async fn winner(&self) -> Option<(ParticipantId, u32)> {
        self.state.lock().await.winner
    }

    async fn finish(&self, state: &mut Game2048State) -> Result<(), SessionError> {
        if !self.core.mark_ended() {
            return Ok(());
        }

        let transport = &self.core.ctx().transport;
        let mut first_error: Option<TransportError> = None;
        let mut best: Option<(ParticipantId, u32)> = None;

        for (id, entry) in state.boards.iter_mut() {
            if entry.board.score() > best.map_or(0, |(_, score)| score) {
                best = Some((*id, entry.board.score()));
            }

            entry.finished = true;
            let Some(message) = entry.message else {
                continue;
            };
            let result = match ignore_gone(transport.clear_markers(message).await) {
                Ok(()) => ignore_gone(transport.edit(message, &entry.render()).await),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        if state.boards.len() > 1 {
            if let Some((id, score)) = best {
                state.winner = best;
                let mention = state.boards[&id].player.mention();
                if let Err(e) = transport
                    .send(&format!("{} has won with a score of {}!", mention, score))
                    .await
                {
                    first_error.get_or_insert(e);
                }
            }
        }

        self.core.release();
        info!(session_id = %self.core.id(), winner = ?state.winner, "🏁 2048 ended");

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GameSession for Game2048 {
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

        let ctx = self.core.ctx();
        for entry in state.boards.values_mut() {
            ctx.with_rng(|rng| entry.board.insert_random(rng));

            let message = ctx.transport.send(&entry.render()).await?;
            entry.message = Some(message);
            self.core.bind_message(message);

            for (symbol, _) in CONTROLS {
                ctx.transport.add_marker(message, symbol).await?;
            }
        }

        self.core.activate();
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

        let ctx = self.core.ctx();
        consume_marker(ctx.transport.as_ref(), message, &symbol, participant.id()).await;

        let Some(direction) = Move::parse(&symbol) else {
            return Ok(());
        };
        // Moves always apply to the reacting player's own board
        let Some(entry) = state.boards.get_mut(&participant.id()) else {
            return Ok(());
        };

        let changed = match direction {
            Move::Fill => {
                let mut filled = false;
                ctx.with_rng(|rng| {
                    while entry.board.insert_random(rng) {
                        filled = true;
                    }
                });
                filled
            }
            _ => {
                let moved = entry.board.shift(direction);
                if moved {
                    ctx.with_rng(|rng| entry.board.insert_random(rng));
                }
                moved
            }
        };

        if !changed {
            debug!(player = %participant, ?direction, "Move changed nothing");
            return Ok(());
        }

        if entry.board.is_stuck() {
            return self.finish(&mut state).await;
        }

        if let Some(message) = entry.message {
            ctx.transport.edit(message, &entry.render()).await?;
        }
        Ok(())
    }

    async fn end(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        self.finish(&mut state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing;

    #[test]
    fn test_slide_line_merges_once_per_pair() {
        assert_eq!(slide_line([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
        assert_eq!(slide_line([0, 2, 0, 2]), ([4, 0, 0, 0], 4));
        assert_eq!(slide_line([4, 2, 2, 0]), ([4, 4, 0, 0], 4));
        assert_eq!(slide_line([2, 4, 8, 16]), ([2, 4, 8, 16], 0));
    }

    #[test]
    fn test_shift_directions() {
        let mut board = Board::from_cells([[0, 0, 0, 2], [0, 0, 0, 0], [0, 0, 0, 2], [0, 0, 0, 0]]);

        assert!(board.shift(Move::Left));
        assert_eq!(board.cells()[0], [2, 0, 0, 0]);

        assert!(board.shift(Move::Down));
        assert_eq!(board.cells()[3], [4, 0, 0, 0]);
        assert_eq!(board.score(), 4);

        assert!(!board.shift(Move::Down));
    }

    #[test]
    fn test_stuck_board() {
        let stuck = Board::from_cells([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(stuck.is_stuck());

        let mergeable = Board::from_cells([[2, 2, 4, 8], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]]);
        assert!(!mergeable.is_stuck());
    }

    #[test]
    fn test_bot_cannot_play() {
        let (ctx, _) = testing::context();
        let alice = Participant::new("Alice").unwrap();

        let result = Game2048::create(ctx.clone(), vec![alice, ctx.bot().clone()]);

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_each_player_gets_a_board() {
        let (ctx, transport) = testing::context();
        let alice = Participant::new("Alice").unwrap();
        let bob = Participant::new("Bob").unwrap();
        let game = Game2048::build(ctx.clone(), vec![alice.clone(), bob.clone()]).unwrap();

        game.begin().await.unwrap();

        for player in [&alice, &bob] {
            let message = game.board_message(player.id()).await.unwrap();
            assert_eq!(transport.message(message).unwrap().markers.len(), 5);
            assert_eq!(ctx.registry.session_for_message(message).unwrap().id(), game.id());
            let tiles: u32 = game
                .board(player.id())
                .await
                .unwrap()
                .cells()
                .iter()
                .flatten()
                .filter(|&&v| v != 0)
                .count() as u32;
            assert_eq!(tiles, 1);
        }
    }

    #[tokio::test]
    async fn test_stuck_board_ends_and_announces_winner() {
        let (ctx, transport) = testing::context();
        let alice = Participant::new("Alice").unwrap();
        let bob = Participant::new("Bob").unwrap();
        let game = Game2048::build(ctx.clone(), vec![alice.clone(), bob.clone()]).unwrap();
        ctx.registry.reserve(game.identity(), game.clone());
        game.begin().await.unwrap();

        // One empty cell whose neighbours can never merge with a 2 or a 4
        let mut nearly_stuck =
            Board::from_cells([[0, 8, 2, 4], [16, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        nearly_stuck.score = 64;
        game.set_board(alice.id(), nearly_stuck).await.unwrap();

        let message = game.board_message(alice.id()).await.unwrap();
        transport.react(message, "🔥", alice.id()).unwrap();
        game.handle(SessionEvent::ReactionAdded {
            participant: alice.clone(),
            symbol: "🔥".to_string(),
            message,
        })
        .await
        .unwrap();

        assert_eq!(game.status(), SessionStatus::Ended);
        assert_eq!(game.winner().await, Some((alice.id(), 64)));
        assert!(ctx.registry.is_empty());
        assert!(ctx.registry.session_for_message(message).is_none());
        assert!(transport
            .sent_contents()
            .iter()
            .any(|c| c == "@Alice has won with a score of 64!"));
        assert!(transport.content(message).unwrap().contains(GAME_OVER));
    }

    #[tokio::test]
    async fn test_no_winner_when_nobody_scored() {
        let (ctx, transport) = testing::context();
        let alice = Participant::new("Alice").unwrap();
        let bob = Participant::new("Bob").unwrap();
        let game = Game2048::build(ctx.clone(), vec![alice, bob]).unwrap();
        ctx.registry.reserve(game.identity(), game.clone());
        game.begin().await.unwrap();

        game.end().await.unwrap();

        assert_eq!(game.status(), SessionStatus::Ended);
        assert_eq!(game.winner().await, None);
        assert!(!transport
            .sent_contents()
            .iter()
            .any(|c| c.contains("has won")));
    }

    #[tokio::test]
    async fn test_other_players_markers_move_their_own_board() {
        let (ctx, transport) = testing::context();
        let alice = Participant::new("Alice").unwrap();
        let bob = Participant::new("Bob").unwrap();
        let game = Game2048::build(ctx, vec![alice.clone(), bob.clone()]).unwrap();
        game.begin().await.unwrap();

        game.set_board(alice.id(), Board::from_cells([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]))
            .await
            .unwrap();
        game.set_board(bob.id(), Board::from_cells([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]))
            .await
            .unwrap();

        // Bob reacts on Alice's board
        let alice_board = game.board_message(alice.id()).await.unwrap();
        transport.react(alice_board, "⬅️", bob.id()).unwrap();
        game.handle(SessionEvent::ReactionAdded {
            participant: bob.clone(),
            symbol: "⬅️".to_string(),
            message: alice_board,
        })
        .await
        .unwrap();

        assert_eq!(game.board(alice.id()).await.unwrap().cells()[0], [0, 0, 0, 2]);
        assert_eq!(game.board(bob.id()).await.unwrap().cells()[0][0], 2);
    }
}
