//! 3rd Brain - terminal chat client
//!
#![doc = "3rd Brain - terminal chat client"]
#![doc = "Main entry point for the thirdbrain application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thirdbrain::cli::{Cli, Commands};
use thirdbrain::commands;
use thirdbrain::config::Config;
use thirdbrain::sender::SendOutcome;
use thirdbrain::session::SessionStore;
use thirdbrain::storage::open_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Open session storage and load sessions
    let storage = open_store(&config.storage, cli.ephemeral)?;
    let mut store = SessionStore::load(storage, config.formatting.system_prompt.clone())?;

    // Execute command
    match cli.command {
        Commands::Chat { session } => {
            if let Some(s) = &session {
                tracing::debug!("Opening session: {}", s);
            }
            commands::chat::run_chat(config, store, session).await?;
            Ok(())
        }
        Commands::Ask {
            prompt,
            session,
            new,
        } => {
            tracing::info!("Sending one-shot prompt");
            let outcome = commands::ask::run_ask(config, store, prompt, session, new).await?;
            if outcome == SendOutcome::Failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Sessions { command } => {
            tracing::info!("Starting sessions command");
            commands::sessions::handle_sessions(command, &mut store)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so streamed responses on stdout stay clean.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "thirdbrain=debug"
    } else {
        "thirdbrain=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
