use crate::application::{AppConfig, GameCatalog, NotifierConfig, SessionRegistry, TurnNotifier};
use crate::domain::{Participant, ParticipantError, ParticipantId};
use crate::traits::{PreferenceStore, Transport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, PoisonError};

/// Everything a command handler or session needs, built once at start-up
pub struct AppContext {
    pub registry: SessionRegistry,
    pub transport: Arc<dyn Transport>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub catalog: GameCatalog,
    pub notifier: NotifierConfig,
    bot: Participant,
    rng: Mutex<StdRng>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        preferences: Arc<dyn PreferenceStore>,
        catalog: GameCatalog,
    ) -> Result<Self, ParticipantError> {
        let bot = Participant::new(config.bot_name)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            registry: SessionRegistry::new(),
            transport,
            preferences,
            catalog,
            notifier: config.notifier,
            bot,
            rng: Mutex::new(rng),
        })
    }

    /// The bot's own participant; it can be mentioned as an opponent
    pub fn bot(&self) -> &Participant {
        &self.bot
    }

    pub fn is_bot(&self, participant: ParticipantId) -> bool {
        self.bot.id() == participant
    }

    /// Run `f` with the shared random number generator
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// A fresh notifier using the configured policy
    pub fn turn_notifier(&self) -> TurnNotifier {
        TurnNotifier::new(self.transport.clone(), self.notifier)
    }

    /// A participant's preference for `app`, falling back to `default`
    pub fn preference_or(
        &self,
        participant: ParticipantId,
        app: &str,
        key: &str,
        default: &str,
    ) -> String {
        self.preferences
            .get(participant, app, key)
            .unwrap_or_else(|| default.to_string())
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("registry", &self.registry)
            .field("notifier", &self.notifier)
            .field("bot", &self.bot)
            .finish_non_exhaustive()
    }
}
