//! Base completion trait and common message types for thirdbrain
//!
//! This module defines the [`CompletionClient`] trait that every endpoint
//! client implements, the [`Message`] type shared by sessions and requests,
//! and the history formatting applied before a request goes out.

use crate::config::FormattingConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user
    User,
    /// Text produced by the model
    Assistant,
    /// Instruction establishing assistant behavior
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Message structure for conversation
///
/// Timestamps are Unix epoch milliseconds. A message is never edited in
/// place; an in-flight assistant placeholder is replaced wholesale once the
/// response completes or fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Creation time in epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Message {
    fn stamped(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Some(now_millis()),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use thirdbrain::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.timestamp.is_some());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::stamped(Role::User, content)
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::stamped(Role::Assistant, content)
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::stamped(Role::System, content)
    }

    /// Creates an empty assistant message marking a response in flight
    ///
    /// # Examples
    ///
    /// ```
    /// use thirdbrain::providers::Message;
    ///
    /// assert!(Message::placeholder().is_placeholder());
    /// assert!(!Message::assistant("done").is_placeholder());
    /// ```
    pub fn placeholder() -> Self {
        Self::stamped(Role::Assistant, String::new())
    }

    /// Whether this is an empty assistant message (an unfinished response)
    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Assistant && self.content.is_empty()
    }
}

/// Current time in Unix epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Per-chunk callback invoked with each streamed content fragment
pub type ChunkCallback<'a> = dyn FnMut(&str) + Send + 'a;

/// Completion client trait
///
/// Implementations send a conversation to a model endpoint and return the
/// full response text. When `on_chunk` is supplied the implementation may
/// stream, invoking the callback with each fragment as it arrives; the
/// returned text is always the complete response.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use thirdbrain::error::Result;
/// use thirdbrain::providers::{ChunkCallback, CompletionClient, Message};
///
/// struct Echo;
///
/// #[async_trait]
/// impl CompletionClient for Echo {
///     async fn complete(
///         &self,
///         messages: &[Message],
///         on_chunk: Option<&mut ChunkCallback<'_>>,
///     ) -> Result<String> {
///         let text = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         if let Some(cb) = on_chunk {
///             cb(&text);
///         }
///         Ok(text)
///     }
/// }
/// ```
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete a conversation
    ///
    /// # Arguments
    ///
    /// * `messages` - Full session history, oldest first
    /// * `on_chunk` - Optional callback for streamed fragments
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, or a
    /// response without usable content
    async fn complete(
        &self,
        messages: &[Message],
        on_chunk: Option<&mut ChunkCallback<'_>>,
    ) -> Result<String>;
}

/// Build the outbound message list from a session history
///
/// Prepends the configured system instruction (when enabled and non-empty),
/// drops system messages and unfinished assistant placeholders from the
/// history, then keeps the most recent
/// `max_previous_messages` messages, or only the latest one when previous
/// messages are excluded. Timestamps are not sent.
///
/// # Examples
///
/// ```
/// use thirdbrain::config::FormattingConfig;
/// use thirdbrain::providers::{format_messages, Message, Role};
///
/// let history = vec![
///     Message::system("stored instruction"),
///     Message::user("first"),
///     Message::assistant("reply"),
///     Message::user("second"),
/// ];
/// let formatting = FormattingConfig {
///     include_previous_messages: false,
///     ..Default::default()
/// };
///
/// let formatted = format_messages(&history, &formatting);
/// assert_eq!(formatted.len(), 2);
/// assert_eq!(formatted[0].role, Role::System);
/// assert_eq!(formatted[1].content, "second");
/// ```
pub fn format_messages(history: &[Message], formatting: &FormattingConfig) -> Vec<Message> {
    let mut formatted = Vec::new();

    if formatting.include_system_prompt && !formatting.system_prompt.is_empty() {
        formatted.push(Message {
            role: Role::System,
            content: formatting.system_prompt.clone(),
            timestamp: None,
        });
    }

    let conversational: Vec<&Message> = history
        .iter()
        .filter(|m| m.role != Role::System && !m.is_placeholder())
        .collect();

    let keep = if formatting.include_previous_messages {
        formatting.max_previous_messages
    } else {
        1
    };
    let start = conversational.len().saturating_sub(keep);

    formatted.extend(conversational[start..].iter().map(|m| Message {
        role: m.role,
        content: m.content.clone(),
        timestamp: None,
    }));

    formatted
}
