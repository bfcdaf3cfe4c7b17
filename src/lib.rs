//! thirdbrain - multi-session chat client library
//!
//! This library provides the core functionality for the 3rd Brain chat
//! client: session management and persistence, the completion client for
//! Ollama-compatible endpoints, incremental stream decoding, and
//! configuration.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Chat sessions, immutable session state, and the session store
//! - `sender`: Sends a user message and folds the response into the session
//! - `providers`: Completion client abstraction, Ollama client, stream decoder
//! - `storage`: Snapshot persistence (embedded database or in-memory)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers for the CLI commands
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use thirdbrain::providers::create_client;
//! use thirdbrain::storage::MemorySnapshotStore;
//! use thirdbrain::{Config, MessageSender, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let mut store = SessionStore::load(
//!         Arc::new(MemorySnapshotStore::new()),
//!         config.formatting.system_prompt.clone(),
//!     )?;
//!     let mut sender = MessageSender::new(create_client(&config)?);
//!     sender.send(&mut store, "Hello!", None).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod sender;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, ThirdBrainError};
pub use sender::{MessageSender, SendOutcome};
pub use session::{ChatSession, SessionState, SessionStore};

#[cfg(test)]
pub mod test_utils;
