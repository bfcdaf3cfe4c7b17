//! Snapshot storage for chat sessions
//!
//! The whole session collection is persisted as a single JSON blob under one
//! key. [`SledSnapshotStore`] keeps it in an embedded database on disk;
//! [`MemorySnapshotStore`] keeps it in memory for tests and ephemeral runs.

use crate::config::StorageConfig;
use crate::error::{Result, ThirdBrainError};
use crate::session::ChatSession;
use anyhow::Context;
use directories::ProjectDirs;
use sled::Db;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key the session snapshot is stored under
pub const SESSIONS_KEY: &str = "3rdBrain_chatSessions";

/// Key/value blob storage for the session snapshot
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot, if any
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored snapshot
    fn write(&self, blob: &str) -> Result<()>;
}

/// On-disk snapshot storage backed by `sled`
pub struct SledSnapshotStore {
    db: Db,
    db_path: PathBuf,
}

impl SledSnapshotStore {
    /// Open the store in the user's data directory
    ///
    /// # Errors
    ///
    /// Returns `ThirdBrainError::Storage` if the data directory cannot be
    /// determined or the database cannot be opened
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "thirdbrain", "thirdbrain")
            .ok_or_else(|| ThirdBrainError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("sessions.db"))
    }

    /// Open the store at a specific database path
    ///
    /// Parent directories are created as needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use thirdbrain::storage::{SledSnapshotStore, SnapshotStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledSnapshotStore::new_with_path(dir.path().join("sessions.db")).unwrap();
    /// assert!(store.read().unwrap().is_none());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| ThirdBrainError::Storage(e.to_string()))?;
        }

        let db = sled::open(&db_path).map_err(|e| open_error(&db_path, e))?;

        tracing::debug!("Opened session database at {}", db_path.display());

        Ok(Self { db, db_path })
    }

    /// Location of the database on disk
    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

impl SnapshotStore for SledSnapshotStore {
    fn read(&self) -> Result<Option<String>> {
        let value = self
            .db
            .get(SESSIONS_KEY)
            .map_err(|e| ThirdBrainError::Storage(format!("Failed to read snapshot: {}", e)))?;

        Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn write(&self, blob: &str) -> Result<()> {
        self.db
            .insert(SESSIONS_KEY, blob.as_bytes())
            .map_err(|e| ThirdBrainError::Storage(format!("Failed to write snapshot: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| ThirdBrainError::Storage(format!("Failed to flush database: {}", e)))?;

        Ok(())
    }
}

/// sled holds an exclusive file lock while a database is open
fn open_error(db_path: &Path, error: sled::Error) -> ThirdBrainError {
    let locked = match &error {
        sled::Error::Io(io) => {
            io.kind() == std::io::ErrorKind::WouldBlock
                || io.to_string().contains("could not acquire lock")
        }
        _ => false,
    };

    if locked {
        ThirdBrainError::Storage(format!(
            "Session database {} is in use by another thirdbrain process; \
             close it or pass --ephemeral",
            db_path.display()
        ))
    } else {
        ThirdBrainError::Storage(format!("Failed to open database: {}", error))
    }
}

/// In-memory snapshot storage
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    blob: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a snapshot
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self) -> Result<Option<String>> {
        let blob = self
            .blob
            .lock()
            .map_err(|_| ThirdBrainError::Storage("Snapshot lock poisoned".to_string()))?;
        Ok(blob.clone())
    }

    fn write(&self, blob: &str) -> Result<()> {
        let mut current = self
            .blob
            .lock()
            .map_err(|_| ThirdBrainError::Storage("Snapshot lock poisoned".to_string()))?;
        *current = Some(blob.to_string());
        Ok(())
    }
}

/// Open the snapshot store selected by configuration
///
/// # Arguments
///
/// * `config` - Storage section of the configuration
/// * `ephemeral` - Keep everything in memory instead of on disk
///
/// # Errors
///
/// Returns error if the on-disk database cannot be opened
pub fn open_store(config: &StorageConfig, ephemeral: bool) -> Result<Arc<dyn SnapshotStore>> {
    if ephemeral {
        tracing::debug!("Using in-memory session storage");
        return Ok(Arc::new(MemorySnapshotStore::new()));
    }

    let store = match &config.path {
        Some(path) => SledSnapshotStore::new_with_path(path)?,
        None => SledSnapshotStore::new()?,
    };
    Ok(Arc::new(store))
}

/// Serialize and write the session collection
///
/// Empty assistant placeholders are dropped; they mark responses that were
/// still in flight.
pub fn save_sessions(store: &dyn SnapshotStore, sessions: &[ChatSession]) -> Result<()> {
    let persisted: Vec<ChatSession> = sessions
        .iter()
        .map(|session| ChatSession {
            messages: session
                .messages
                .iter()
                .filter(|m| !m.is_placeholder())
                .cloned()
                .collect(),
            ..session.clone()
        })
        .collect();

    let blob = serde_json::to_string(&persisted)
        .context("Failed to serialize sessions")
        .map_err(|e| ThirdBrainError::Storage(e.to_string()))?;

    store.write(&blob)?;
    tracing::debug!("Persisted {} sessions", persisted.len());
    Ok(())
}

/// Read and parse the session collection
///
/// A missing snapshot yields an empty collection. So does one that fails to
/// parse; the corruption is logged and the data is overwritten on the next
/// save.
pub fn load_sessions(store: &dyn SnapshotStore) -> Result<Vec<ChatSession>> {
    let Some(blob) = store.read()? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<ChatSession>>(&blob) {
        Ok(sessions) => {
            tracing::debug!("Loaded {} sessions", sessions.len());
            Ok(sessions)
        }
        Err(e) => {
            tracing::warn!("Discarding unreadable session snapshot: {}", e);
            Ok(Vec::new())
        }
    }
}
