use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How a [`TurnNotifier`](crate::application::TurnNotifier) updates its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotifierPolicy {
    /// Edit in place, resend after a quiet interval
    EditOrResend,
    /// Skip identical text, otherwise delete and resend after a quiet interval
    #[default]
    DedupResend,
}

impl fmt::Display for NotifierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifierPolicy::EditOrResend => write!(f, "edit-or-resend"),
            NotifierPolicy::DedupResend => write!(f, "dedup-resend"),
        }
    }
}

impl FromStr for NotifierPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edit-or-resend" => Ok(NotifierPolicy::EditOrResend),
            "dedup-resend" => Ok(NotifierPolicy::DedupResend),
            other => Err(format!(
                "unknown notifier policy '{}' (expected edit-or-resend or dedup-resend)",
                other
            )),
        }
    }
}

/// Turn notifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub policy: NotifierPolicy,
    pub quiet_interval: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            policy: NotifierPolicy::default(),
            quiet_interval: Duration::from_secs(5),
        }
    }
}

impl NotifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: NotifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_quiet_interval(mut self, interval: Duration) -> Self {
        self.quiet_interval = interval;
        self
    }
}

/// Process-wide settings, read once at start-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub notifier: NotifierConfig,

    /// Display name of the bot participant
    pub bot_name: String,

    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notifier: NotifierConfig::default(),
            bot_name: "gamebot".to_string(),
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifier(mut self, notifier: NotifierConfig) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
