//! Ollama chat client implementation for thirdbrain
//!
//! This module implements the [`CompletionClient`] trait for Ollama-style
//! `/api/chat` endpoints. Requests carry the formatted history plus decoding
//! options; responses are either a single JSON object or, when streaming,
//! newline-delimited JSON handed to the stream decoder.

use crate::config::{DecodingOptions, FormattingConfig, ModelConfig};
use crate::error::{Result, ThirdBrainError};
use crate::providers::stream::decode_stream;
use crate::providers::{format_messages, ChunkCallback, CompletionClient, Message};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body text used when a failed response carries nothing readable
const NO_ERROR_DETAILS: &str = "No error details available";

/// Ollama chat endpoint client
///
/// # Examples
///
/// ```no_run
/// use thirdbrain::config::Config;
/// use thirdbrain::providers::{CompletionClient, Message, OllamaClient};
///
/// # async fn example() -> thirdbrain::error::Result<()> {
/// let config = Config::default();
/// let client = OllamaClient::new(
///     config.model.clone(),
///     config.options,
///     config.formatting.clone(),
/// )?;
///
/// let mut print = |chunk: &str| print!("{}", chunk);
/// let text = client
///     .complete(&[Message::user("Hello!")], Some(&mut print))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct OllamaClient {
    client: Client,
    model: ModelConfig,
    options: DecodingOptions,
    formatting: FormattingConfig,
}

/// Request structure for the chat endpoint
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

/// Message structure for the chat endpoint
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Decoding options as sent on the wire
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

/// Non-streamed response from the chat endpoint
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaResponseMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Arguments
    ///
    /// * `model` - Endpoint location, model name, and streaming preference
    /// * `options` - Sampling options sent with every request
    /// * `formatting` - History formatting applied before each request
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use thirdbrain::config::Config;
    /// use thirdbrain::providers::OllamaClient;
    ///
    /// let config = Config::default();
    /// let client = OllamaClient::new(config.model, config.options, config.formatting);
    /// assert!(client.is_ok());
    /// ```
    pub fn new(
        model: ModelConfig,
        options: DecodingOptions,
        formatting: FormattingConfig,
    ) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("thirdbrain/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = model.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ThirdBrainError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama client: url={}, model={}",
            model.chat_url(),
            model.name
        );

        Ok(Self {
            client,
            model,
            options,
            formatting,
        })
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.model.name
    }

    /// Full URL requests are posted to
    pub fn chat_url(&self) -> String {
        self.model.chat_url()
    }

    fn build_request(&self, messages: &[Message], stream: bool) -> OllamaChatRequest {
        let messages = format_messages(messages, &self.formatting)
            .into_iter()
            .map(|m| OllamaMessage {
                role: m.role.to_string(),
                content: m.content,
            })
            .collect();

        OllamaChatRequest {
            model: self.model.name.clone(),
            messages,
            stream,
            options: OllamaOptions {
                temperature: self.options.temperature,
                top_p: self.options.top_p,
                max_tokens: self.options.max_tokens,
            },
        }
    }
}

/// Extract the response text from a non-streamed body
fn parse_single_response(body: &str) -> Result<String> {
    let response: OllamaChatResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!("Failed to parse chat response: {}", e);
        ThirdBrainError::Serialization(e)
    })?;

    tracing::debug!("Chat response: done={}", response.done);

    let message = response.message.ok_or(ThirdBrainError::MissingMessage)?;
    match message.content {
        Some(content) if !content.is_empty() => Ok(content),
        _ => Err(ThirdBrainError::MissingContent.into()),
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(
        &self,
        messages: &[Message],
        on_chunk: Option<&mut ChunkCallback<'_>>,
    ) -> Result<String> {
        let stream = self.model.stream && on_chunk.is_some();
        let request = self.build_request(messages, stream);
        let url = self.model.chat_url();

        tracing::debug!(
            "Sending chat request: url={}, messages={}, stream={}",
            url,
            request.messages.len(),
            stream
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Chat request failed: {}", e);
                ThirdBrainError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) if !text.trim().is_empty() => text,
                _ => NO_ERROR_DETAILS.to_string(),
            };
            tracing::error!("Endpoint returned error {}: {}", status, body);
            return Err(ThirdBrainError::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        match on_chunk {
            Some(callback) if stream => decode_stream(response.bytes_stream(), callback).await,
            callback => {
                let body = response.text().await.map_err(|e| {
                    tracing::error!("Failed to read chat response body: {}", e);
                    ThirdBrainError::Transport(e.to_string())
                })?;
                let text = parse_single_response(&body)?;
                // A caller that asked for chunks still sees the text once
                if let Some(callback) = callback {
                    callback(&text);
                }
                Ok(text)
            }
        }
    }
}
