//! Special commands parser for interactive chat mode
//!
//! This module parses the slash commands available during an interactive
//! chat. They manage sessions instead of being sent to the model:
//! - Create, list, switch, and delete sessions
//! - Clear the active session
//! - Show the active session's history
//! - Display help and exit
//!
//! Command names are case-insensitive; session id arguments are kept as typed.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new session and make it active
    NewSession,

    /// List all sessions
    ListSessions,

    /// Make another session active (full id or unique prefix)
    SwitchSession(String),

    /// Delete a session (full id or unique prefix)
    DeleteSession(String),

    /// Reset the active session to just its system message
    Clear,

    /// Print the active session's messages
    History,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the model as a regular message.
    None,
}

/// Parse a user input string into a special command
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None for non-commands.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command that takes no argument gets one.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use thirdbrain::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewSession);
/// assert_eq!(
///     parse_special_command("/switch abcd1234").unwrap(),
///     SpecialCommand::SwitchSession("abcd1234".to_string())
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/switch" => required_arg(&name, "/switch <session-id>", arg)
            .map(|id| SpecialCommand::SwitchSession(id.to_string())),
        "/delete" => required_arg(&name, "/delete <session-id>", arg)
            .map(|id| SpecialCommand::DeleteSession(id.to_string())),
        "/new" => no_arg(&name, arg, SpecialCommand::NewSession),
        "/sessions" | "/list" => no_arg(&name, arg, SpecialCommand::ListSessions),
        "/clear" => no_arg(&name, arg, SpecialCommand::Clear),
        "/history" => no_arg(&name, arg, SpecialCommand::History),
        "/help" | "/?" => no_arg(&name, arg, SpecialCommand::Help),
        "/exit" | "/quit" => no_arg(&name, arg, SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

fn required_arg<'a>(command: &str, usage: &str, arg: &'a str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(arg)
    }
}

fn no_arg(command: &str, arg: &str, parsed: SpecialCommand) -> Result<SpecialCommand, CommandError> {
    if arg.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        })
    }
}

/// Display help information for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

SESSIONS:
  /new            - Start a new conversation
  /sessions       - List all conversations
  /list           - Same as /sessions
  /switch <id>    - Switch to a conversation (id or unique prefix)
  /delete <id>    - Delete a conversation (id or unique prefix)

CURRENT CONVERSATION:
  /clear          - Clear the current conversation
  /history        - Show the messages of the current conversation

SESSION CONTROL:
  /help           - Show this help message
  /?              - Same as /help
  exit            - Exit interactive mode
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the model
  - Conversations are saved automatically after every message
"#
    );
}
