//! Chat sessions and the session collection
//!
//! [`SessionState`] is an immutable snapshot of every session plus the
//! active session id. Each `with_*` transition consumes one snapshot and
//! returns the next; [`SessionStore`] owns the current snapshot and persists
//! it after every change.

pub mod store;

pub use store::SessionStore;

use crate::error::{Result, ThirdBrainError};
use crate::providers::{now_millis, Message, Role};
use serde::{Deserialize, Serialize};

/// Title given to sessions without a user message
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Number of words taken from the first user message for a title
const TITLE_WORDS: usize = 5;

/// Title length (in characters) beyond which it is truncated
const TITLE_MAX_CHARS: usize = 30;

/// One independent conversation thread
///
/// # Examples
///
/// ```
/// use thirdbrain::session::{ChatSession, DEFAULT_TITLE};
///
/// let session = ChatSession::new("You are helpful.");
/// assert_eq!(session.title, DEFAULT_TITLE);
/// assert_eq!(session.messages.len(), 1);
/// assert_eq!(session.id.len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Display title
    pub title: String,
    /// Conversation history, oldest first
    pub messages: Vec<Message>,
    /// Last modification time in epoch milliseconds
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
}

impl ChatSession {
    /// Create a session holding only the system message
    pub fn new(system_prompt: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: vec![Message::system(system_prompt)],
            last_updated: now_millis(),
        }
    }

    /// Messages shown to the user
    ///
    /// System messages and unfinished assistant placeholders are hidden.
    pub fn display_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System && !m.is_placeholder())
    }

    /// First eight characters of the id
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// Derive a title from the first user message
///
/// Takes the first five space-separated words; if the result is longer than
/// thirty characters it is cut to thirty and `...` is appended.
///
/// # Examples
///
/// ```
/// use thirdbrain::providers::Message;
/// use thirdbrain::session::generate_title;
///
/// let title = generate_title(&[Message::user("Hello there")]);
/// assert_eq!(title, "Hello there");
///
/// let title = generate_title(&[Message::user("Tell me about quantum computing please")]);
/// assert_eq!(title, "Tell me about quantum computin...");
/// ```
pub fn generate_title(messages: &[Message]) -> String {
    let Some(first_user) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };

    let title = first_user
        .content
        .split(' ')
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    if title.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = title.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        title
    }
}

/// Snapshot of the session collection
///
/// The active id, when set, always names a session in the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
}

impl SessionState {
    /// Build a snapshot from loaded sessions; the first becomes active
    pub fn from_sessions(sessions: Vec<ChatSession>) -> Self {
        let active_id = sessions.first().map(|s| s.id.clone());
        Self {
            sessions,
            active_id,
        }
    }

    /// All sessions, most recently created first
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// Identifier of the active session
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active session, falling back to the first one
    pub fn active(&self) -> Option<&ChatSession> {
        self.active_id
            .as_deref()
            .and_then(|id| self.get(id))
            .or_else(|| self.sessions.first())
    }

    /// Look up a session by exact id
    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Whether the collection holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Insert a session at the front and make it active
    pub fn with_created(mut self, session: ChatSession) -> Self {
        self.active_id = Some(session.id.clone());
        self.sessions.insert(0, session);
        self
    }

    /// Make `id` active if it exists; otherwise return the snapshot unchanged
    pub fn with_switched(mut self, id: &str) -> Self {
        if self.get(id).is_some() {
            self.active_id = Some(id.to_string());
        }
        self
    }

    /// Remove a session
    ///
    /// When the active session is removed the first remaining one becomes
    /// active. When nothing remains, `fresh` supplies a replacement. Unknown
    /// ids leave the snapshot unchanged.
    pub fn with_deleted(mut self, id: &str, fresh: impl FnOnce() -> ChatSession) -> Self {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return self;
        }

        if self.sessions.is_empty() {
            return Self::default().with_created(fresh());
        }

        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.sessions.first().map(|s| s.id.clone());
        }
        self
    }

    /// Reset a session to just the system message and the default title
    pub fn with_cleared(self, id: &str, system_prompt: &str) -> Self {
        self.with_updated(id, |session| ChatSession {
            title: DEFAULT_TITLE.to_string(),
            messages: vec![Message::system(system_prompt)],
            last_updated: now_millis(),
            ..session
        })
    }

    /// Replace the session named `id` with `update(session)`
    pub fn with_updated(
        mut self,
        id: &str,
        update: impl FnOnce(ChatSession) -> ChatSession,
    ) -> Self {
        if let Some(pos) = self.sessions.iter().position(|s| s.id == id) {
            let session = self.sessions.remove(pos);
            self.sessions.insert(pos, update(session));
        }
        self
    }

    /// Resolve a full id or a unique id prefix
    ///
    /// # Errors
    ///
    /// Returns `ThirdBrainError::SessionNotFound` when nothing matches or the
    /// prefix is ambiguous
    pub fn resolve_id(&self, prefix: &str) -> Result<String> {
        if let Some(session) = self.get(prefix) {
            return Ok(session.id.clone());
        }

        let matches: Vec<&ChatSession> = if prefix.is_empty() {
            Vec::new()
        } else {
            self.sessions
                .iter()
                .filter(|s| s.id.starts_with(prefix))
                .collect()
        };

        match matches.as_slice() {
            [only] => Ok(only.id.clone()),
            [] => Err(ThirdBrainError::SessionNotFound(prefix.to_string()).into()),
            _ => Err(ThirdBrainError::SessionNotFound(format!(
                "{} (matches {} sessions)",
                prefix,
                matches.len()
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_id(id: &str) -> ChatSession {
        ChatSession {
            id: id.to_string(),
            ..ChatSession::new("sys")
        }
    }

    fn state_of(ids: &[&str]) -> SessionState {
        SessionState::from_sessions(ids.iter().map(|id| session_with_id(id)).collect())
    }

    #[test]
    fn test_new_session_shape() {
        let session = ChatSession::new("Be kind.");
        assert_eq!(session.messages[0].role, Role::System);
        assert_eq!(session.messages[0].content, "Be kind.");
        assert!(uuid::Uuid::parse_str(&session.id).is_ok());
        assert_eq!(session.short_id().len(), 8);
    }

    #[test]
    fn test_title_short_message() {
        assert_eq!(generate_title(&[Message::user("Hello")]), "Hello");
    }

    #[test]
    fn test_title_takes_five_words() {
        let title = generate_title(&[Message::user("one two three four five six seven")]);
        assert_eq!(title, "one two three four five");
    }

    #[test]
    fn test_title_truncates_long_words() {
        let title = generate_title(&[Message::user("Tell me about quantum computing please")]);
        assert_eq!(title, "Tell me about quantum computin...");
        assert_eq!(title.chars().count(), 33);
    }

    #[test]
    fn test_title_exactly_thirty_chars_is_kept() {
        let content = "abcdefghij abcdefghij abcdefgh";
        assert_eq!(content.len(), 30);
        assert_eq!(generate_title(&[Message::user(content)]), content);
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let content = "ééééééééééééééééééééééééé";
        assert_eq!(generate_title(&[Message::user(content)]), content);
    }

    #[test]
    fn test_title_uses_first_user_message() {
        let messages = vec![
            Message::system("sys"),
            Message::user("first question"),
            Message::user("second question"),
        ];
        assert_eq!(generate_title(&messages), "first question");
    }

    #[test]
    fn test_title_without_user_message() {
        assert_eq!(generate_title(&[Message::system("sys")]), DEFAULT_TITLE);
    }

    #[test]
    fn test_with_created_inserts_front_and_activates() {
        let state = state_of(&["a"]);
        let state = state.with_created(session_with_id("b"));
        assert_eq!(state.sessions()[0].id, "b");
        assert_eq!(state.active_id(), Some("b"));
    }

    #[test]
    fn test_with_switched_unknown_is_noop() {
        let state = state_of(&["a", "b"]);
        let switched = state.clone().with_switched("zzz");
        assert_eq!(switched, state);

        let switched = state.with_switched("b");
        assert_eq!(switched.active_id(), Some("b"));
    }

    #[test]
    fn test_with_deleted_active_activates_first_remaining() {
        let state = state_of(&["a", "b", "c"]).with_switched("b");
        let state = state.with_deleted("b", || session_with_id("fresh"));
        assert_eq!(state.sessions().len(), 2);
        assert_eq!(state.active_id(), Some("a"));
    }

    #[test]
    fn test_with_deleted_inactive_keeps_active() {
        let state = state_of(&["a", "b"]).with_switched("b");
        let state = state.with_deleted("a", || session_with_id("fresh"));
        assert_eq!(state.active_id(), Some("b"));
    }

    #[test]
    fn test_with_deleted_last_creates_fresh() {
        let state = state_of(&["only"]);
        let state = state.with_deleted("only", || session_with_id("fresh"));
        assert_eq!(state.sessions().len(), 1);
        assert_eq!(state.active_id(), Some("fresh"));
    }

    #[test]
    fn test_with_deleted_unknown_is_noop() {
        let state = state_of(&["a"]);
        let after = state
            .clone()
            .with_deleted("missing", || session_with_id("fresh"));
        assert_eq!(after, state);
    }

    #[test]
    fn test_active_id_always_valid_after_create_delete_sequence() {
        let mut state = SessionState::default().with_created(session_with_id("s0"));
        for i in 1..6 {
            state = state.with_created(session_with_id(&format!("s{}", i)));
        }
        for id in ["s3", "s5", "s0", "s4", "s1", "s2"] {
            state = state.with_deleted(id, || session_with_id("fresh"));
            let active = state.active_id().unwrap();
            assert!(state.get(active).is_some());
        }
        assert_eq!(state.sessions().len(), 1);
    }

    #[test]
    fn test_with_cleared_resets_only_target() {
        let state = state_of(&["a", "b"])
            .with_updated("a", |mut s| {
                s.title = "Busy".to_string();
                s.messages.push(Message::user("hi"));
                s
            })
            .with_updated("b", |mut s| {
                s.title = "Other".to_string();
                s.messages.push(Message::user("yo"));
                s
            });

        let state = state.with_cleared("a", "fresh prompt");
        let a = state.get("a").unwrap();
        assert_eq!(a.title, DEFAULT_TITLE);
        assert_eq!(a.messages.len(), 1);
        assert_eq!(a.messages[0].role, Role::System);

        let b = state.get("b").unwrap();
        assert_eq!(b.title, "Other");
        assert_eq!(b.messages.len(), 2);
    }

    #[test]
    fn test_with_updated_keeps_position() {
        let state = state_of(&["a", "b", "c"]).with_updated("b", |mut s| {
            s.title = "Changed".to_string();
            s
        });
        assert_eq!(state.sessions()[1].id, "b");
        assert_eq!(state.sessions()[1].title, "Changed");
    }

    #[test]
    fn test_active_falls_back_to_first() {
        let state = state_of(&["a", "b"]);
        assert_eq!(state.active().unwrap().id, "a");
        assert!(SessionState::default().active().is_none());
    }

    #[test]
    fn test_resolve_id_full_and_prefix() {
        let state = state_of(&[
            "abcdef12-3456-7890-abcd-ef1234567890",
            "abc99999-3456-7890-abcd-ef1234567890",
        ]);
        assert_eq!(
            state.resolve_id("abcdef12").unwrap(),
            "abcdef12-3456-7890-abcd-ef1234567890"
        );
        assert!(state.resolve_id("abc").is_err());
        assert!(state.resolve_id("zzz").is_err());
        assert!(state.resolve_id("").is_err());
    }

    #[test]
    fn test_display_messages_hides_system_and_placeholder() {
        let mut session = ChatSession::new("sys");
        session.messages.push(Message::user("hi"));
        session.messages.push(Message::placeholder());
        let shown: Vec<_> = session.display_messages().collect();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].content, "hi");
    }

    #[test]
    fn test_session_serializes_last_updated_camel_case() {
        let session = session_with_id("x");
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("last_updated").is_none());
    }
}
