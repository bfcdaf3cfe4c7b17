//! Session store: owns the current [`SessionState`] and persists it

use crate::error::Result;
use crate::session::{ChatSession, SessionState};
use crate::storage::{load_sessions, save_sessions, SnapshotStore};
use std::sync::Arc;

/// Explicit container for the session collection
///
/// Every mutation goes through a pure [`SessionState`] transition and is
/// followed by a write of the filtered snapshot.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use thirdbrain::session::SessionStore;
/// use thirdbrain::storage::MemorySnapshotStore;
///
/// # fn main() -> thirdbrain::error::Result<()> {
/// let mut store = SessionStore::load(Arc::new(MemorySnapshotStore::new()), "Be helpful.")?;
/// assert_eq!(store.sessions().len(), 1);
///
/// let id = store.create_session()?;
/// assert_eq!(store.active_session_id(), Some(id.as_str()));
/// # Ok(())
/// # }
/// ```
pub struct SessionStore {
    state: SessionState,
    storage: Arc<dyn SnapshotStore>,
    system_prompt: String,
}

impl SessionStore {
    /// Load sessions from storage
    ///
    /// A missing, empty, or unreadable snapshot produces a single fresh
    /// session, which is written back immediately. Otherwise the first stored
    /// session becomes active.
    ///
    /// # Errors
    ///
    /// Returns error if the storage backend itself fails
    pub fn load(storage: Arc<dyn SnapshotStore>, system_prompt: impl Into<String>) -> Result<Self> {
        let system_prompt = system_prompt.into();
        let sessions = load_sessions(storage.as_ref())?;

        let mut store = Self {
            state: SessionState::from_sessions(sessions),
            storage,
            system_prompt,
        };

        if store.state.is_empty() {
            tracing::info!("No stored sessions, starting a new one");
            let fresh = ChatSession::new(&store.system_prompt);
            store.apply(|state| state.with_created(fresh))?;
        }

        Ok(store)
    }

    /// Current snapshot
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// All sessions, most recently created first
    pub fn sessions(&self) -> &[ChatSession] {
        self.state.sessions()
    }

    /// The active session
    pub fn active_session(&self) -> Option<&ChatSession> {
        self.state.active()
    }

    /// Identifier of the active session
    pub fn active_session_id(&self) -> Option<&str> {
        self.state.active().map(|s| s.id.as_str())
    }

    /// Look up a session by exact id
    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.state.get(id)
    }

    /// System instruction new and cleared sessions start with
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Resolve a full id or unique prefix to a session id
    pub fn resolve_id(&self, prefix: &str) -> Result<String> {
        self.state.resolve_id(prefix)
    }

    /// Create a new session at the front and make it active
    ///
    /// Returns the new session id.
    pub fn create_session(&mut self) -> Result<String> {
        let session = ChatSession::new(&self.system_prompt);
        let id = session.id.clone();
        self.apply(|state| state.with_created(session))?;
        tracing::debug!("Created session {}", id);
        Ok(id)
    }

    /// Make `id` active if it exists
    ///
    /// Returns whether the switch happened; unknown ids are ignored.
    pub fn switch_session(&mut self, id: &str) -> bool {
        let state = std::mem::take(&mut self.state);
        self.state = state.with_switched(id);
        let switched = self.state.active_id() == Some(id);
        if !switched {
            tracing::debug!("Ignoring switch to unknown session {}", id);
        }
        switched
    }

    /// Delete a session, repairing the active id as needed
    pub fn delete_session(&mut self, id: &str) -> Result<()> {
        let system_prompt = self.system_prompt.clone();
        self.apply(|state| state.with_deleted(id, || ChatSession::new(&system_prompt)))?;
        tracing::debug!("Deleted session {}", id);
        Ok(())
    }

    /// Reset the active session, or create one if none is active
    pub fn clear(&mut self) -> Result<()> {
        match self.active_session_id().map(str::to_string) {
            Some(id) => self.clear_session(&id),
            None => self.create_session().map(|_| ()),
        }
    }

    /// Reset a specific session to just its system message
    pub fn clear_session(&mut self, id: &str) -> Result<()> {
        let system_prompt = self.system_prompt.clone();
        self.apply(|state| state.with_cleared(id, &system_prompt))
    }

    /// Replace the session `id` with `update(session)` and persist
    pub fn update_session(
        &mut self,
        id: &str,
        update: impl FnOnce(ChatSession) -> ChatSession,
    ) -> Result<()> {
        self.apply(|state| state.with_updated(id, update))
    }

    /// Write the current snapshot to storage
    pub fn persist(&self) -> Result<()> {
        save_sessions(self.storage.as_ref(), self.state.sessions())
    }

    fn apply(&mut self, transition: impl FnOnce(SessionState) -> SessionState) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state);
        self.persist()
    }
}
