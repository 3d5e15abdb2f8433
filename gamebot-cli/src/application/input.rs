use gamebot_core::MessageHandle;

pub const HELP: &str = "\
Commands (one per line):
  <name> play GAME [@opponent...]   start a game
  <name> end [@opponent...]         end the game with those people
  <name> prefs [APP [KEY]]          show your preferences
  <name> set APP KEY VALUE          change a preference
  <name> react #MESSAGE SYMBOL      put a marker on a message
  games | status | help | quit";

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Play {
        author: String,
        game: String,
        mentions: Vec<String>,
    },
    End {
        author: String,
        mentions: Vec<String>,
    },
    Prefs {
        author: String,
        app: Option<String>,
        key: Option<String>,
    },
    Set {
        author: String,
        app: Option<String>,
        key: Option<String>,
        value: Option<String>,
    },
    React {
        author: String,
        message: MessageHandle,
        symbol: String,
    },
    Games,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Expected `<name> <command> ...`; type `help` for commands")]
    MissingCommand,

    #[error("Unknown command '{0}'; type `help` for commands")]
    UnknownCommand(String),

    #[error("Usage: `<name> react #MESSAGE SYMBOL`")]
    BadReact,
}

/// Parse a line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<ConsoleInput>, InputError> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };

    match first.to_lowercase().as_str() {
        "games" => return Ok(Some(ConsoleInput::Games)),
        "status" => return Ok(Some(ConsoleInput::Status)),
        "help" => return Ok(Some(ConsoleInput::Help)),
        "quit" | "exit" => return Ok(Some(ConsoleInput::Quit)),
        _ => {}
    }

    let author = first.to_string();
    let verb = words.next().ok_or(InputError::MissingCommand)?;
    let rest: Vec<String> = words.map(str::to_string).collect();
    let arg = |i: usize| rest.get(i).cloned();

    let input = match verb.to_lowercase().as_str() {
        "play" => ConsoleInput::Play {
            author,
            game: arg(0).unwrap_or_default(),
            mentions: rest.iter().skip(1).cloned().collect(),
        },
        "end" => ConsoleInput::End {
            author,
            mentions: rest,
        },
        "prefs" | "preferences" => ConsoleInput::Prefs {
            author,
            app: arg(0),
            key: arg(1),
        },
        "set" => ConsoleInput::Set {
            author,
            app: arg(0),
            key: arg(1),
            value: (rest.len() > 2).then(|| rest[2..].join(" ")),
        },
        "react" => {
            let (Some(message), Some(symbol)) = (arg(0), arg(1)) else {
                return Err(InputError::BadReact);
            };
            ConsoleInput::React {
                author,
                message: message.parse().map_err(|_| InputError::BadReact)?,
                symbol,
            }
        }
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };

    Ok(Some(input))
}
