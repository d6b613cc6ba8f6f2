//! Session store backends: a JSON-file directory store and an in-memory
//! store for tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Session, SessionStore, RETENTION};
use crate::utils::SessionError;

/// One JSON file per session under a base directory. Checkpoints are
/// written to a temp file and renamed into place so a crash mid-write
/// never corrupts the previous record.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read_session(path: &Path) -> Result<Session, SessionError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl SessionStore for FileSessionStore {
    fn checkpoint(&self, session: &Session) -> Result<(), SessionError> {
        let path = self.path_for(session.id);
        if path.exists() {
            let stored = Self::read_session(&path)?;
            if session.revision <= stored.revision {
                return Err(SessionError::StaleCheckpoint(session.id));
            }
        }
        let tmp = self.dir.join(format!("{}.json.tmp", session.id));
        fs::write(&tmp, serde_json::to_vec_pretty(session)?)?;
        fs::rename(&tmp, &path)?;
        debug!(
            "Checkpointed session {} (revision {})",
            session.id, session.revision
        );
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Option<Session>, SessionError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_session(&path)?))
    }

    fn list_resumable(&self) -> Result<Vec<Session>, SessionError> {
        let now = Utc::now();
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_session(&path) {
                Ok(session) if session.is_resumable(now) => sessions.push(session),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable session file {:?}: {e}", path),
            }
        }
        sessions.sort_by_key(|s| std::cmp::Reverse(s.updated_at));
        Ok(sessions)
    }

    fn delete(&self, id: Uuid) -> Result<(), SessionError> {
        let path = self.path_for(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn gc(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let expired = match Self::read_session(&path) {
                Ok(session) => session.is_expired(now, RETENTION),
                // Unreadable records age out too; treat as expired
                Err(_) => true,
            };
            if expired {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Session GC removed {removed} record(s)");
        }
        Ok(removed)
    }
}

/// Mutex-guarded map store. Used by tests that should not touch the
/// filesystem; checkpoint monotonicity matches the file store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn checkpoint(&self, session: &Session) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(stored) = sessions.get(&session.id) {
            if session.revision <= stored.revision {
                return Err(SessionError::StaleCheckpoint(session.id));
            }
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.lock().unwrap().get(&id).cloned())
    }

    fn list_resumable(&self) -> Result<Vec<Session>, SessionError> {
        let now = Utc::now();
        let mut sessions: Vec<Session> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.is_resumable(now))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.updated_at));
        Ok(sessions)
    }

    fn delete(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions.lock().unwrap().remove(&id);
        Ok(())
    }

    fn gc(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, RETENTION));
        Ok(before - sessions.len())
    }
}
