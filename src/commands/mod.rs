/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command handlers:

- `chat`     — Interactive chat REPL
- `ask`      — Send a single prompt and print the response
- `sessions` — List, show, create, delete, and clear sessions

These handlers are intentionally small and use the library components:
the session store, the message sender, and the completion client.
*/

use crate::config::Config;
use crate::error::Result;
use crate::providers::create_client;
use crate::sender::{MessageSender, SendOutcome, ERROR_MESSAGE};
use crate::session::SessionStore;
use colored::Colorize;
use std::io::Write;

// Special commands parser for the chat REPL
pub mod special_commands;

// Session listing and management
pub mod sessions;

/// Print a streamed fragment immediately
fn print_chunk(chunk: &str) {
    print!("{}", chunk);
    let _ = std::io::stdout().flush();
}

/// Send one message and render the response as it streams
async fn send_and_render(
    sender: &mut MessageSender,
    store: &mut SessionStore,
    content: &str,
) -> Result<SendOutcome> {
    let mut on_chunk = |chunk: &str| print_chunk(chunk);
    let outcome = sender.send(store, content, Some(&mut on_chunk)).await?;

    match &outcome {
        SendOutcome::Completed(_) => println!("\n"),
        SendOutcome::Failed => eprintln!("{}\n", ERROR_MESSAGE.red()),
        SendOutcome::Ignored => {}
    }
    Ok(outcome)
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Creates the completion client and message sender, then runs a
    //! readline-based loop. Slash commands manage sessions; anything else is
    //! sent to the model in the active session.

    use super::*;
    use crate::commands::sessions::{print_session_list, print_session_messages};
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Longest session title shown in the prompt
    const PROMPT_TITLE_CHARS: usize = 24;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `store` - Loaded session store
    /// * `session` - Optional session to open (full id or unique prefix)
    ///
    /// # Errors
    ///
    /// Returns error if the client or line editor cannot be created, the
    /// requested session does not exist, or persisting a session fails
    pub async fn run_chat(
        config: Config,
        mut store: SessionStore,
        session: Option<String>,
    ) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        if let Some(prefix) = session {
            let id = store.resolve_id(&prefix)?;
            store.switch_session(&id);
        }

        let client = create_client(&config)?;
        let mut sender = MessageSender::new(client);

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config, &store);

        loop {
            let prompt = format_prompt(&store);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {
                            println!();
                            send_and_render(&mut sender, &mut store, &line).await?;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(command) => handle_special_command(command, &mut store)?,
                        Err(e) => eprintln!("{}\n", e.to_string().red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn handle_special_command(command: SpecialCommand, store: &mut SessionStore) -> Result<()> {
        match command {
            SpecialCommand::NewSession => {
                store.create_session()?;
                println!("{}\n", "Started a new conversation.".green());
            }
            SpecialCommand::ListSessions => print_session_list(store),
            SpecialCommand::SwitchSession(prefix) => match store.resolve_id(&prefix) {
                Ok(id) => {
                    store.switch_session(&id);
                    if let Some(session) = store.active_session() {
                        println!(
                            "{}\n",
                            format!("Switched to \"{}\"", session.title).green()
                        );
                    }
                }
                Err(e) => eprintln!("{}\n", e.to_string().red()),
            },
            SpecialCommand::DeleteSession(prefix) => match store.resolve_id(&prefix) {
                Ok(id) => {
                    store.delete_session(&id)?;
                    println!("{}\n", format!("Deleted session {}", id).green());
                }
                Err(e) => eprintln!("{}\n", e.to_string().red()),
            },
            SpecialCommand::Clear => {
                store.clear()?;
                println!("{}\n", "Conversation cleared.".green());
            }
            SpecialCommand::History => {
                if let Some(session) = store.active_session() {
                    print_session_messages(session);
                }
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    /// Prompt showing the (shortened) active session title
    fn format_prompt(store: &SessionStore) -> String {
        let title = store
            .active_session()
            .map(|s| s.title.as_str())
            .unwrap_or_default();
        let title = if title.chars().count() > PROMPT_TITLE_CHARS {
            format!(
                "{}...",
                title.chars().take(PROMPT_TITLE_CHARS).collect::<String>()
            )
        } else {
            title.to_string()
        };
        format!("{} {} ", format!("[{}]", title).cyan(), ">>".bold())
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(config: &Config, store: &SessionStore) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              3rd Brain Interactive Chat - Welcome!           ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Model:         {}", config.model.name.cyan());
        println!("Endpoint:      {}", config.model.chat_url());
        println!("Conversations: {}", store.sessions().len());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

}

// One-shot prompt handler
pub mod ask {
    //! Send a single prompt and print the streamed response.

    use super::*;

    /// Send `prompt` and print the response
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `store` - Loaded session store
    /// * `prompt` - Text to send
    /// * `session` - Session to send into (full id or unique prefix)
    /// * `new_session` - Start a new session for this prompt
    ///
    /// # Returns
    ///
    /// Returns the send outcome so the caller can set the exit status
    ///
    /// # Errors
    ///
    /// Returns error if the session does not exist, the client cannot be
    /// created, or persisting fails
    pub async fn run_ask(
        config: Config,
        mut store: SessionStore,
        prompt: String,
        session: Option<String>,
        new_session: bool,
    ) -> Result<SendOutcome> {
        if new_session {
            store.create_session()?;
        } else if let Some(prefix) = session {
            let id = store.resolve_id(&prefix)?;
            store.switch_session(&id);
        }

        let client = create_client(&config)?;
        let mut sender = MessageSender::new(client);

        send_and_render(&mut sender, &mut store, &prompt).await
    }
}
