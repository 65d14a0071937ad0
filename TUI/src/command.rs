use crate::action::Intent;
use crate::model::{Mode, ModeParseError};

/// What a slash command asks the app to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Forward to the conversation store
    Store(Intent),
    Help,
    CopyChat,
    Quit,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("not a command")]
    NotACommand,
    #[error("usage: /mode <chat|image|math|code>")]
    MissingMode,
    #[error(transparent)]
    BadMode(#[from] ModeParseError),
    #[error("unknown command: {0}. Type /help for available commands.")]
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    /// Parses `input`; `current_mode` is used by a bare `/new`.
    pub fn parse(input: &str, current_mode: Mode) -> Result<Command, CommandError> {
        let input = input.trim();
        if !input.starts_with('/') {
            return Err(CommandError::NotACommand);
        }

        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        let args = args.trim();

        match cmd {
            "/help" => Ok(Command::Help),
            "/new" => {
                let mode = if args.is_empty() { current_mode } else { args.parse()? };
                Ok(Command::Store(Intent::CreateSession(mode)))
            }
            "/mode" => {
                if args.is_empty() {
                    Err(CommandError::MissingMode)
                } else {
                    Ok(Command::Store(Intent::SetMode(args.parse()?)))
                }
            }
            "/stop" => Ok(Command::Store(Intent::CancelReply)),
            "/sidebar" => Ok(Command::Store(Intent::ToggleSidebar)),
            "/theme" => Ok(Command::Store(Intent::ToggleDarkMode)),
            "/copy" => Ok(Command::CopyChat),
            "/quit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(cmd.to_string())),
        }
    }
}
