//! Session records and checkpointing for crash/abort recovery.
//!
//! A session captures which admitted files have reached a terminal state so
//! an interrupted run can be resumed without re-transforming them. Only
//! lightweight progress is persisted; artifact bytes never touch the store.

pub mod file_store;

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::core::Fingerprint;
use crate::utils::SessionError;

/// How long after its last checkpoint a session stays resumable.
pub const RESUME_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// How long session records are retained before garbage collection.
pub const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Aborted,
}

/// A failed item's fingerprint with the recorded reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub fingerprint: Fingerprint,
    pub error: String,
}

/// Persistent record of one packaging run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub project_name: String,
    pub started_at: DateTime<Utc>,
    /// Advanced on every recorded terminal state and checkpoint
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,
    /// Monotonic checkpoint counter; the store rejects regressions
    pub revision: u64,
    /// Fingerprints of the full admitted set, in admitted order
    pub fingerprints: Vec<Fingerprint>,
    /// Items that transformed successfully
    pub completed: Vec<Fingerprint>,
    /// Items that failed, with reasons; failures are terminal (no retry)
    pub failed: Vec<FailedItem>,
}

impl Session {
    pub fn new(project_name: impl Into<String>, fingerprints: Vec<Fingerprint>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_name: project_name.into(),
            started_at: now,
            updated_at: now,
            status: SessionStatus::InProgress,
            revision: 0,
            fingerprints,
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record_completed(&mut self, fingerprint: Fingerprint) {
        self.completed.push(fingerprint);
        self.updated_at = Utc::now();
    }

    pub fn record_failed(&mut self, fingerprint: Fingerprint, error: impl Into<String>) {
        self.failed.push(FailedItem {
            fingerprint,
            error: error.into(),
        });
        self.updated_at = Utc::now();
    }

    pub fn mark(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Fingerprints that already reached a terminal state. A resumed run
    /// skips these entirely.
    pub fn terminal_fingerprints(&self) -> HashSet<&Fingerprint> {
        self.completed
            .iter()
            .chain(self.failed.iter().map(|f| &f.fingerprint))
            .collect()
    }

    /// Adds supplied fingerprints not already recorded, preserving
    /// admitted order. Keeps the completed/failed sets subsets of the
    /// recorded set when a resume supplies extra files.
    pub fn extend_fingerprints(&mut self, supplied: &[Fingerprint]) {
        let mut known: HashSet<Fingerprint> = self.fingerprints.iter().cloned().collect();
        for fingerprint in supplied {
            if known.insert(fingerprint.clone()) {
                self.fingerprints.push(fingerprint.clone());
            }
        }
        self.updated_at = Utc::now();
    }

    /// Validates that the re-supplied file set covers every fingerprint
    /// this session recorded. Extra files are fine; missing ones fail the
    /// resume closed.
    pub fn validate_resume(&self, supplied: &[Fingerprint]) -> Result<(), SessionError> {
        let supplied: HashSet<&Fingerprint> = supplied.iter().collect();
        let missing = self
            .fingerprints
            .iter()
            .filter(|fp| !supplied.contains(fp))
            .count();
        if missing > 0 {
            return Err(SessionError::ResumeMismatch { missing });
        }
        debug!("Resume set validated for session {}", self.id);
        Ok(())
    }

    pub fn is_resumable(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::InProgress && !self.is_expired(now, RESUME_WINDOW)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let age = now.signed_duration_since(self.updated_at);
        age.to_std().map(|age| age > window).unwrap_or(false)
    }
}

/// Persistence backend for session records.
///
/// `checkpoint` must be atomic and monotonic: a record with a revision not
/// greater than the stored one is rejected with `StaleCheckpoint`.
pub trait SessionStore: Send + Sync {
    fn checkpoint(&self, session: &Session) -> Result<(), SessionError>;
    fn load(&self, id: Uuid) -> Result<Option<Session>, SessionError>;
    fn list_resumable(&self) -> Result<Vec<Session>, SessionError>;
    fn delete(&self, id: Uuid) -> Result<(), SessionError>;
    /// Removes records older than [`RETENTION`]; returns how many.
    fn gc(&self) -> Result<usize, SessionError>;
}
