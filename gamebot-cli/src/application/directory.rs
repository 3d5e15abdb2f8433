use gamebot_core::{Participant, ParticipantError};
use std::collections::HashMap;

/// Console participants, created on first mention and looked up by name
///
/// Names match case-insensitively; the bot is always present so it can be
/// challenged with `@<bot-name>`.
#[derive(Debug, Default)]
pub struct ParticipantDirectory {
    by_name: HashMap<String, Participant>,
}

impl ParticipantDirectory {
    pub fn new(bot: &Participant) -> Self {
        let mut directory = Self::default();
        directory.by_name.insert(key(bot.name()), bot.clone());
        directory
    }

    pub fn resolve(&mut self, name: &str) -> Result<Participant, ParticipantError> {
        let name = name.trim_start_matches('@');
        if let Some(participant) = self.by_name.get(&key(name)) {
            return Ok(participant.clone());
        }

        let participant = Participant::new(name)?;
        tracing::debug!(participant = %participant, id = %participant.id(), "New console participant");
        self.by_name.insert(key(name), participant.clone());
        Ok(participant)
    }

    pub fn resolve_all(&mut self, names: &[String]) -> Result<Vec<Participant>, ParticipantError> {
        names.iter().map(|name| self.resolve(name)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}
