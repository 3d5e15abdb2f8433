use crate::application::AppContext;
use crate::domain::Participant;
use crate::games::{connect4, game2048, tictactoe, Connect4, Game2048, TicTacToe};
use crate::traits::{ConfigError, PreferenceKey, SharedSession, GLOBAL_APP};
use std::sync::Arc;

/// Builds a session for the given participants, author first
pub type GameFactory = fn(Arc<AppContext>, Vec<Participant>) -> Result<SharedSession, ConfigError>;

#[derive(Debug, Clone, Copy)]
pub struct GameEntry {
    pub name: &'static str,
    pub summary: &'static str,
    pub preferences: &'static [PreferenceKey],
    pub factory: GameFactory,
}

/// Name-keyed table of playable games, in registration order
#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    entries: Vec<GameEntry>,
    global: Vec<PreferenceKey>,
}

impl GameCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The games shipped with the bot
    pub fn bundled() -> Self {
        Self::new()
            .register(GameEntry {
                name: tictactoe::NAME,
                summary: "Tic-Tac-Toe for two; pick a row and a column",
                preferences: &[],
                factory: TicTacToe::create,
            })
            .register(GameEntry {
                name: connect4::NAME,
                summary: "Connect four discs in a row on a 7×6 board",
                preferences: connect4::PREFERENCES,
                factory: Connect4::create,
            })
            .register(GameEntry {
                name: game2048::NAME,
                summary: "Slide and merge tiles; everyone gets their own board",
                preferences: &[],
                factory: Game2048::create,
            })
    }

    /// Add a game; a later entry with the same name replaces the earlier one
    pub fn register(mut self, entry: GameEntry) -> Self {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Advertise a setting under the `global` app
    pub fn register_global(mut self, key: PreferenceKey) -> Self {
        self.global.push(key);
        self
    }

    pub fn get(&self, name: &str) -> Option<&GameEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn entries(&self) -> &[GameEntry] {
        &self.entries
    }

    /// Settings advertised by `app`, or `None` for an unknown app
    pub fn preferences_of(&self, app: &str) -> Option<&[PreferenceKey]> {
        if app == GLOBAL_APP {
            return Some(&self.global);
        }
        self.get(app).map(|e| e.preferences)
    }

    pub fn preference_exists(&self, app: &str, key: &str) -> bool {
        self.preferences_of(app)
            .is_some_and(|keys| keys.iter().any(|k| k.key == key))
    }
}
