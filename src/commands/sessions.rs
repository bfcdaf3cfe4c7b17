//! Session listing and management output

use crate::cli::SessionCommand;
use crate::error::Result;
use crate::providers::{now_millis, Role};
use crate::session::{ChatSession, SessionStore};
use chrono::TimeZone;
use colored::Colorize;
use prettytable::{format, Table};

/// Longest title shown in the session table
const MAX_TITLE_CHARS: usize = 40;

/// Handle `thirdbrain sessions ...` commands
pub fn handle_sessions(command: SessionCommand, store: &mut SessionStore) -> Result<()> {
    match command {
        SessionCommand::List => print_session_list(store),
        SessionCommand::Show { id } => {
            let id = store.resolve_id(&id)?;
            if let Some(session) = store.get(&id) {
                print_session_messages(session);
            }
        }
        SessionCommand::New => {
            let id = store.create_session()?;
            println!("{}", format!("Created session {}", id).green());
        }
        SessionCommand::Delete { id } => {
            let id = store.resolve_id(&id)?;
            store.delete_session(&id)?;
            println!("{}", format!("Deleted session {}", id).green());
        }
        SessionCommand::Clear { id } => {
            let id = match id {
                Some(prefix) => store.resolve_id(&prefix)?,
                None => match store.active_session_id() {
                    Some(active) => active.to_string(),
                    None => return store.clear(),
                },
            };
            store.clear_session(&id)?;
            println!("{}", format!("Cleared session {}", id).green());
        }
    }

    Ok(())
}

/// Print every session as a table, marking the active one
pub fn print_session_list(store: &SessionStore) {
    let sessions = store.sessions();
    if sessions.is_empty() {
        println!("{}", "No conversations found.".yellow());
        return;
    }

    let now = now_millis();
    let active_id = store.active_session_id();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "",
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        let marker = if Some(session.id.as_str()) == active_id {
            "*".green()
        } else {
            "".normal()
        };

        table.add_row(prettytable::row![
            marker,
            session.short_id().cyan(),
            truncate_title(&session.title),
            session.display_messages().count(),
            format_time_ago(session.last_updated, now)
        ]);
    }

    println!("\nConversations:");
    table.printstd();
    println!();
}

/// Print a session's visible messages with their times
pub fn print_session_messages(session: &ChatSession) {
    println!("\n{} {}", session.title.bold(), format!("({})", session.id).dimmed());

    let mut shown = 0;
    for message in session.display_messages() {
        shown += 1;
        let label = match message.role {
            Role::User => "You".cyan().bold(),
            _ => "3rd Brain".green().bold(),
        };
        println!(
            "\n{} {}\n{}",
            label,
            format_message_time(message.timestamp).dimmed(),
            message.content
        );
    }

    if shown == 0 {
        println!("{}", "No messages yet.".yellow());
    }
    println!();
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let kept: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{}...", kept)
    } else {
        title.to_string()
    }
}

/// Describe how long ago `timestamp` was, relative to `now` (both epoch millis)
///
/// # Examples
///
/// ```
/// use thirdbrain::commands::sessions::format_time_ago;
///
/// let now = 1_700_000_000_000;
/// assert_eq!(format_time_ago(now - 5 * 60 * 1000, now), "5 minutes ago");
/// assert_eq!(format_time_ago(now - 3 * 86_400_000, now), "3 days ago");
/// ```
pub fn format_time_ago(timestamp: i64, now: i64) -> String {
    let seconds = now.saturating_sub(timestamp).max(0) / 1000;

    const UNITS: &[(i64, &str)] = &[
        (31_536_000, "year"),
        (2_592_000, "month"),
        (86_400, "day"),
        (3_600, "hour"),
        (60, "minute"),
    ];

    for (unit_seconds, name) in UNITS {
        if seconds >= *unit_seconds {
            return plural(seconds / unit_seconds, name);
        }
    }
    plural(seconds, "second")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Local `HH:MM` for a message timestamp; empty when unknown
pub fn format_message_time(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ms| chrono::Local.timestamp_millis_opt(ms).single())
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_default()
}
