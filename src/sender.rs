//! Message sender
//!
//! Orchestrates one exchange: append the user message to the active session,
//! call the completion client while forwarding streamed chunks, then fold the
//! final response (or a fixed apology on failure) back into the session.

use crate::error::Result;
use crate::providers::{now_millis, ChunkCallback, CompletionClient, Message, Role};
use crate::session::{generate_title, ChatSession, SessionStore};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Assistant text recorded when a completion fails
pub const ERROR_MESSAGE: &str = "I apologize, but I encountered an error. Please try again later.";

/// Result of a [`MessageSender::send`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank or there was no session to send into
    Ignored,
    /// The response completed; carries the full text
    Completed(String),
    /// The completion failed and the apology was recorded
    Failed,
}

/// Sends user messages and records responses
///
/// Holds the loading/streaming flags and the transient streamed text for
/// the exchange in flight. `send` takes `&mut self`, so one exchange runs at
/// a time.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use thirdbrain::config::Config;
/// use thirdbrain::providers::create_client;
/// use thirdbrain::sender::{MessageSender, SendOutcome};
/// use thirdbrain::session::SessionStore;
/// use thirdbrain::storage::MemorySnapshotStore;
///
/// # async fn example() -> thirdbrain::error::Result<()> {
/// let config = Config::default();
/// let mut store = SessionStore::load(
///     Arc::new(MemorySnapshotStore::new()),
///     config.formatting.system_prompt.clone(),
/// )?;
/// let mut sender = MessageSender::new(create_client(&config)?);
///
/// let mut print = |chunk: &str| print!("{}", chunk);
/// let outcome = sender.send(&mut store, "Hello!", Some(&mut print)).await?;
/// assert!(matches!(outcome, SendOutcome::Completed(_) | SendOutcome::Failed));
/// # Ok(())
/// # }
/// ```
pub struct MessageSender {
    client: Arc<dyn CompletionClient>,
    is_loading: bool,
    is_streaming: bool,
    streamed_text: String,
}

impl MessageSender {
    /// Create a sender around a completion client
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            is_loading: false,
            is_streaming: false,
            streamed_text: String::new(),
        }
    }

    /// Whether a request is in flight
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether a response is being streamed
    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    /// Text streamed so far for the exchange in flight
    pub fn streamed_text(&self) -> &str {
        &self.streamed_text
    }

    /// Send `content` in the active session
    ///
    /// Blank input is ignored. Completion failures are recorded in the
    /// session as [`ERROR_MESSAGE`] and reported as [`SendOutcome::Failed`];
    /// they are not returned as errors.
    ///
    /// # Arguments
    ///
    /// * `store` - Session store holding the active session
    /// * `content` - Text typed by the user
    /// * `on_chunk` - Receives each streamed fragment; `None` disables streaming
    ///
    /// # Errors
    ///
    /// Returns error only when persisting the session fails
    pub async fn send(
        &mut self,
        store: &mut SessionStore,
        content: &str,
        on_chunk: Option<&mut ChunkCallback<'_>>,
    ) -> Result<SendOutcome> {
        if content.trim().is_empty() {
            debug!("Ignoring blank input");
            return Ok(SendOutcome::Ignored);
        }

        let Some(session_id) = store.active_session_id().map(str::to_string) else {
            warn!("No active session to send into");
            return Ok(SendOutcome::Ignored);
        };

        info!("Sending message in session {}", session_id);

        let user_message = Message::user(content);
        store.update_session(&session_id, |session| {
            append_user_message(session, user_message)
        })?;

        self.is_loading = true;
        self.is_streaming = true;
        self.streamed_text.clear();

        let result = self.exchange(store, &session_id, on_chunk).await;

        self.is_loading = false;
        self.is_streaming = false;
        self.streamed_text.clear();

        result
    }

    async fn exchange(
        &mut self,
        store: &mut SessionStore,
        session_id: &str,
        on_chunk: Option<&mut ChunkCallback<'_>>,
    ) -> Result<SendOutcome> {
        store.update_session(session_id, |mut session| {
            session.messages.push(Message::placeholder());
            session
        })?;

        let history = store
            .get(session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default();

        let client = Arc::clone(&self.client);
        let streamed_text = &mut self.streamed_text;

        let response = match on_chunk {
            Some(callback) => {
                let mut forward = |chunk: &str| {
                    streamed_text.push_str(chunk);
                    callback(chunk);
                };
                client.complete(&history, Some(&mut forward)).await
            }
            None => client.complete(&history, None).await,
        };

        match response {
            Ok(text) => {
                if text.is_empty() {
                    warn!("Completion returned no text");
                }
                let assistant_message = Message::assistant(text.clone());
                store.update_session(session_id, |session| {
                    finish_with_response(session, assistant_message)
                })?;
                debug!("Recorded response of {} chars", text.chars().count());
                Ok(SendOutcome::Completed(text))
            }
            Err(e) => {
                error!("Error sending message: {:#}", e);
                store.update_session(session_id, finish_with_error)?;
                Ok(SendOutcome::Failed)
            }
        }
    }
}

fn append_user_message(mut session: ChatSession, message: Message) -> ChatSession {
    let first_exchange = session.messages.len() <= 1;
    session.messages.push(message);
    if first_exchange {
        session.title = generate_title(&session.messages);
    }
    session.last_updated = now_millis();
    session
}

fn finish_with_response(mut session: ChatSession, message: Message) -> ChatSession {
    session.messages.retain(|m| !m.is_placeholder());
    session.messages.push(message);
    session.last_updated = now_millis();
    session
}

fn finish_with_error(mut session: ChatSession) -> ChatSession {
    if let Some(last) = session.messages.last_mut() {
        if last.role == Role::Assistant && last.content.is_empty() {
            *last = Message::assistant(ERROR_MESSAGE);
        }
    }
    session.last_updated = now_millis();
    session
}
