//! Session record persistence.
//!
//! After every successful authentication the extension persists the
//! session id, JID, and a timestamp so a later connection can attempt
//! a rebind instead of a full login. Storage is a collaborator behind
//! the [`SessionStore`] trait; the crate ships an in-memory store and
//! a JSON file store persisted across process restarts.
//!
//! The store holds a single logical record per application identity.
//! Concurrent connections sharing one store are not supported and the
//! behavior is undefined (known limitation).

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{P1Error, Result};
use crate::jid::Jid;

/// Persisted session data enabling a later rebind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session id issued by the server
    pub session_id: String,
    /// Full JID the session was bound to
    pub jid: Jid,
    /// When this record was last written
    pub timestamp: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a record stamped with the current time.
    pub fn new(session_id: &str, jid: Jid) -> Self {
        Self {
            session_id: session_id.to_string(),
            jid,
            timestamp: Utc::now(),
        }
    }
}

/// Session record storage collaborator.
///
/// The core overwrites the record on every successful authentication
/// and reads it when deciding whether to rebind. It never clears the
/// record itself; that is the host application's call.
pub trait SessionStore: Send + Sync {
    /// Load the stored record, if any.
    fn load(&self) -> Result<Option<SessionRecord>>;

    /// Overwrite the stored record.
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Remove the stored record.
    fn clear(&self) -> Result<()>;
}

/// In-memory store, useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<SessionRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<SessionRecord>>> {
        self.record
            .lock()
            .map_err(|_| P1Error::Store("session store lock poisoned".to_string()))
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        *self.slot()? = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}

/// JSON file store persisted across process restarts.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<SessionRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(P1Error::Store(format!("failed to read session file: {e}"))),
        };
        let record = serde_json::from_str(&content)
            .map_err(|e| P1Error::Store(format!("failed to parse session file: {e}")))?;
        Ok(Some(record))
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| P1Error::Store(format!("failed to create store dir: {e}")))?;
        }
        let content = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, content)
            .map_err(|e| P1Error::Store(format!("failed to write session file: {e}")))
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(P1Error::Store(format!("failed to clear session file: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let record = SessionRecord::new("abc", "user@example.com/mobile".parse().unwrap());
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), Some(record));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());

        let record = SessionRecord::new("abc", "user@example.com/mobile".parse().unwrap());
        store.save(&record).unwrap();

        // A fresh store over the same path sees the record.
        let reopened = FileStore::new(dir.path().join("session.json"));
        let loaded = reopened.load().unwrap().unwrap();
        assert_eq!(loaded.session_id, "abc");
        assert_eq!(loaded.jid.to_string(), "user@example.com/mobile");

        store.clear().unwrap();
        assert!(reopened.load().unwrap().is_none());
        // Clearing an already-empty store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));

        let first = SessionRecord::new("abc", "user@example.com/a".parse().unwrap());
        let second = SessionRecord::new("def", "user@example.com/b".parse().unwrap());
        store.save(&first).unwrap();
        store.save(&second).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.session_id, "def");
    }

    #[test]
    fn test_file_store_rejects_corrupt_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(store.load().is_err());
    }
}
