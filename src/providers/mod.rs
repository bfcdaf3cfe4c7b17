//! Completion client module for thirdbrain
//!
//! This module contains the completion client abstraction, the Ollama chat
//! implementation, and the incremental decoder for streamed responses.

pub mod base;
pub mod ollama;
pub mod stream;

pub use base::{
    format_messages, now_millis, ChunkCallback, CompletionClient, Message, Role,
};
pub use ollama::OllamaClient;
pub use stream::{decode_stream, NdjsonDecoder};

use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;

/// Create a completion client from configuration
///
/// # Arguments
///
/// * `config` - Full configuration; the model, options, and formatting
///   sections are used
///
/// # Returns
///
/// Returns a shared client handle suitable for a [`MessageSender`]
///
/// [`MessageSender`]: crate::sender::MessageSender
///
/// # Errors
///
/// Returns error if client initialization fails
///
/// # Examples
///
/// ```
/// use thirdbrain::config::Config;
/// use thirdbrain::providers::create_client;
///
/// let client = create_client(&Config::default());
/// assert!(client.is_ok());
/// ```
pub fn create_client(config: &Config) -> Result<Arc<dyn CompletionClient>> {
    let client = OllamaClient::new(
        config.model.clone(),
        config.options,
        config.formatting.clone(),
    )?;
    Ok(Arc::new(client))
}
