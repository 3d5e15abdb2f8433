use crate::application::{AppContext, EventDispatcher};
use crate::domain::{Interaction, Participant, ParticipantIdentity};
use crate::traits::{ConfigError, SessionError, SharedSession, GLOBAL_APP};
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{info, warn};

/// Errors reported back to the user who issued a command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("I don't know what that game is! Use `play` to list available games.")]
    UnknownGame(String),

    #[error("Whoops: {0}")]
    Config(#[from] ConfigError),

    #[error("Game with {people} already exists... `end` the game first!")]
    SessionConflict { people: String },

    #[error("No game found with {people}")]
    SessionNotFound { people: String },

    #[error("I'm not sure what app or game '{0}' is!")]
    UnknownApp(String),

    #[error("That app / key combo cannot be customized! Are you sure that setting exists?")]
    UnknownPreference { app: String, key: String },

    #[error("{0}")]
    MissingArgument(String),

    #[error("Something went wrong with that game: {0}")]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// The people taking part in a command: the author first, then everyone
/// mentioned, each once
pub fn participants(author: &Participant, mentions: &[Participant]) -> Vec<Participant> {
    let mut seen = HashSet::new();
    std::iter::once(author)
        .chain(mentions.iter())
        .filter(|p| seen.insert(p.id()))
        .cloned()
        .collect()
}

fn people(players: &[Participant]) -> String {
    players
        .iter()
        .map(Participant::mention)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Command surface driving the session core
///
/// Each method returns the reply to post; errors carry user-facing text.
pub struct CommandHandler {
    ctx: Arc<AppContext>,
    dispatcher: Arc<EventDispatcher>,
}

impl CommandHandler {
    pub fn new(ctx: Arc<AppContext>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { ctx, dispatcher }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Start `game` for the author and everyone they mention
    ///
    /// The registry is only touched once the game accepted the participants.
    /// A session whose `begin` fails is ended again before returning.
    #[tracing::instrument(skip(self, author, mentions), fields(author = %author))]
    pub async fn start_session(
        &self,
        game: &str,
        author: &Participant,
        mentions: &[Participant],
    ) -> Result<SharedSession> {
        if game.is_empty() {
            return Err(CommandError::MissingArgument(format!(
                "Usage: `play GAME [@opponent]`\nAvailable games are {}",
                self.ctx.catalog.names().join(", ")
            )));
        }

        let entry = self
            .ctx
            .catalog
            .get(game)
            .ok_or_else(|| CommandError::UnknownGame(game.to_string()))?;

        let players = participants(author, mentions);
        let identity = ParticipantIdentity::from_participants(&players)
            .map_err(|_| ConfigError::NotEnoughPlayers)?;

        if self.ctx.registry.lookup_by_identity(&identity).is_some() {
            return Err(CommandError::SessionConflict {
                people: people(&players),
            });
        }

        let session = (entry.factory)(Arc::clone(&self.ctx), players)?;

        if !self.ctx.registry.reserve(session.identity(), session.clone()) {
            return Err(CommandError::SessionConflict {
                people: people(session.participants()),
            });
        }

        info!(session_id = %session.id(), game, "🎮 Starting session");
        if let Err(e) = session.begin().await {
            warn!(session_id = %session.id(), error = %e, "Session failed to begin, ending it");
            if let Err(e) = session.end().await {
                warn!(session_id = %session.id(), error = %e, "Cleanup after failed begin also failed");
            }
            return Err(e.into());
        }

        Ok(session)
    }

    /// End the session of exactly the author and the mentioned participants
    #[tracing::instrument(skip(self, author, mentions), fields(author = %author))]
    pub async fn end_session(&self, author: &Participant, mentions: &[Participant]) -> Result<String> {
        let players = participants(author, mentions);
        let people = people(&players);
        let identity = ParticipantIdentity::from_participants(&players)
            .map_err(|_| ConfigError::NotEnoughPlayers)?;

        let Some(session) = self.ctx.registry.release(&identity) else {
            return Err(CommandError::SessionNotFound { people });
        };

        info!(session_id = %session.id(), "🛑 Ending session on request");
        let ended = session.end().await;
        self.dispatcher.close(session.id());
        ended?;
        Ok(format!("Ended game with {}", people))
    }

    /// Show the author's settings: everything, one app, or one key
    pub fn preferences(&self, author: &Participant, app: Option<&str>, key: Option<&str>) -> Result<String> {
        let store = &self.ctx.preferences;

        let Some(app) = app else {
            let mut reply = String::from("Your Preferences:\n");
            for (app, settings) in store.all_for(author.id()) {
                let _ = write!(reply, "\n**__{}__**", app);
                for (key, value) in settings {
                    let _ = write!(reply, "\n{} = {}", key, value);
                }
            }
            return Ok(reply);
        };

        self.check_app(app)?;

        let Some(key) = key else {
            let mut reply = format!("Your Preferences for **{}**:\n", app);
            for (key, value) in store.all_for_app(author.id(), app) {
                let _ = write!(reply, "\n{} = {}", key, value);
            }
            return Ok(reply);
        };

        Ok(match store.get(author.id(), app, key) {
            Some(value) => format!("{} = {}", key, value),
            None => format!("{} isn't customized yet", key),
        })
    }

    /// Store a setting, then tell the author's sessions about it
    #[tracing::instrument(skip(self, author), fields(author = %author))]
    pub async fn set_preference(
        &self,
        author: &Participant,
        app: Option<&str>,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<String> {
        let app = app.ok_or_else(|| {
            CommandError::MissingArgument(format!(
                "Usage: `set APP KEY VALUE` where APP is '{}' or a game name",
                GLOBAL_APP
            ))
        })?;
        self.check_app(app)?;

        let key = key.ok_or_else(|| CommandError::MissingArgument("Key has to be specified".to_string()))?;
        if !self.ctx.catalog.preference_exists(app, key) {
            return Err(CommandError::UnknownPreference {
                app: app.to_string(),
                key: key.to_string(),
            });
        }

        let value = value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CommandError::MissingArgument("Value has to be specified".to_string()))?;

        self.ctx
            .preferences
            .set(author.id(), app, key, value.to_string());

        self.dispatcher
            .dispatch_and_wait(Interaction::preference_changed(author.clone()))
            .await;

        Ok(format!("{} = {}", key, value))
    }

    /// Usage text listing every game
    pub fn games(&self) -> String {
        let mut reply = String::from("Usage: `play GAME [@opponent]`\nAvailable games:");
        for entry in self.ctx.catalog.entries() {
            let _ = write!(reply, "\n  {} - {}", entry.name, entry.summary);
            for pref in entry.preferences {
                let _ = write!(reply, "\n      {}: {}", pref.key, pref.description);
            }
        }
        reply
    }

    fn check_app(&self, app: &str) -> Result<()> {
        if self.ctx.catalog.preferences_of(app).is_none() {
            return Err(CommandError::UnknownApp(app.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionStatus;
    use crate::games::testing;

    fn handler() -> CommandHandler {
        let (ctx, _) = testing::context();
        let dispatcher = Arc::new(EventDispatcher::new(ctx.clone()));
        CommandHandler::new(ctx, dispatcher)
    }

    fn named(name: &str) -> Participant {
        Participant::new(name).unwrap()
    }

    #[test]
    fn test_participants_put_author_first_once() {
        let alice = named("Alice");
        let bob = named("Bob");

        let players = participants(&alice, &[bob.clone(), alice.clone(), bob.clone()]);

        assert_eq!(players, vec![alice, bob]);
    }

    #[tokio::test]
    async fn test_start_unknown_game() {
        let handler = handler();

        let err = handler.start_session("chess", &named("Alice"), &[]).await.err().unwrap();

        assert!(matches!(err, CommandError::UnknownGame(_)));
        assert!(handler.context().registry.is_empty());
    }

    #[tokio::test]
    async fn test_start_without_game_lists_games() {
        let handler = handler();

        let err = handler.start_session("", &named("Alice"), &[]).await.err().unwrap();

        assert_eq!(
            err.to_string(),
            "Usage: `play GAME [@opponent]`\nAvailable games are tictactoe, connect4, 2048"
        );
    }

    #[tokio::test]
    async fn test_config_error_leaves_registry_untouched() {
        let handler = handler();

        let err = handler.start_session("tictactoe", &named("Alice"), &[]).await.err().unwrap();

        assert_eq!(err.to_string(), "Whoops: You didn't tell me who to play this game with!");
        assert!(handler.context().registry.is_empty());
    }

    #[tokio::test]
    async fn test_same_group_conflicts_regardless_of_order() {
        let handler = handler();
        let alice = named("Alice");
        let bob = named("Bob");

        handler.start_session("tictactoe", &alice, &[bob.clone()]).await.unwrap();
        let err = handler
            .start_session("connect4", &bob, &[alice.clone()])
            .await
            .err()
            .unwrap();

        assert_eq!(
            err.to_string(),
            "Game with @Bob and @Alice already exists... `end` the game first!"
        );
        assert_eq!(handler.context().registry.len(), 1);
    }

    #[tokio::test]
    async fn test_participant_can_join_different_groups() {
        let handler = handler();
        let alice = named("Alice");

        handler.start_session("tictactoe", &alice, &[named("Bob")]).await.unwrap();
        handler.start_session("connect4", &alice, &[named("Carol")]).await.unwrap();

        assert_eq!(handler.context().registry.sessions_for(alice.id()).len(), 2);
    }

    #[tokio::test]
    async fn test_end_session_then_not_found() {
        let handler = handler();
        let alice = named("Alice");
        let bob = named("Bob");
        let session = handler.start_session("tictactoe", &alice, &[bob.clone()]).await.unwrap();

        let reply = handler.end_session(&bob, &[alice.clone()]).await.unwrap();
        assert_eq!(reply, "Ended game with @Bob and @Alice");
        assert_eq!(session.status(), SessionStatus::Ended);
        assert!(handler.context().registry.is_empty());

        let err = handler.end_session(&alice, &[bob]).await.err().unwrap();
        assert!(matches!(err, CommandError::SessionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_preference_validates_app_and_key() {
        let handler = handler();
        let alice = named("Alice");

        let err = handler
            .set_preference(&alice, Some("chess"), Some("emoji"), Some("x"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::UnknownApp(_)));

        let err = handler
            .set_preference(&alice, Some("connect4"), Some("sound"), Some("on"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::UnknownPreference { .. }));

        let err = handler
            .set_preference(&alice, Some("connect4"), Some("emoji"), None)
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Value has to be specified");
    }

    #[tokio::test]
    async fn test_set_preference_stores_and_reads_back() {
        let handler = handler();
        let alice = named("Alice");

        let reply = handler
            .set_preference(&alice, Some("connect4"), Some("emoji"), Some("🟣"))
            .await
            .unwrap();
        assert_eq!(reply, "emoji = 🟣");

        assert_eq!(
            handler.preferences(&alice, Some("connect4"), Some("emoji")).unwrap(),
            "emoji = 🟣"
        );
        assert!(handler
            .preferences(&alice, None, None)
            .unwrap()
            .contains("**__connect4__**\nemoji = 🟣"));
        assert!(matches!(
            handler.preferences(&alice, Some("chess"), None),
            Err(CommandError::UnknownApp(_))
        ));
    }

    #[test]
    fn test_games_lists_catalog() {
        let handler = handler();
        let text = handler.games();

        assert!(text.contains("tictactoe"));
        assert!(text.contains("emoji: Game board emoji"));
    }
}
