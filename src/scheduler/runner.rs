//! Run orchestration: admission, session bookkeeping, the adaptive batch
//! loop and final archive assembly.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use super::batch::BatchState;
use super::memory::{PressureMonitor, PressurePolicy, PressureSampler};
use crate::admission::{self, AdmissionLimits};
use crate::archive;
use crate::core::{
    Candidate, Fingerprint, Package, ProcessingSettings, ProgressEvent, ProgressSink, SourceItem,
    Stage, TransformResult,
};
use crate::session::{Session, SessionStatus, SessionStore};
use crate::transform;
use crate::utils::{PackagerError, PackagerResult, SessionError};

/// Knobs for a packaging run. Defaults match production behavior; tests
/// tighten them.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub limits: AdmissionLimits,
    /// Dispatch window before any pressure feedback arrives
    pub initial_batch_size: usize,
    /// Minimum time between persisted checkpoints
    pub checkpoint_interval: Duration,
    pub policy: PressurePolicy,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            limits: AdmissionLimits::default(),
            initial_batch_size: 10,
            checkpoint_interval: Duration::from_secs(30),
            policy: PressurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Cancelled between batches; the session checkpoint survives
    Aborted,
}

/// Summary returned to the caller when a run ends.
#[derive(Debug)]
pub struct RunReport {
    pub session_id: Uuid,
    pub status: RunStatus,
    /// Items that passed admission
    pub admitted: usize,
    /// Items transformed successfully in this run
    pub completed: usize,
    /// Items that failed terminally in this run
    pub failed: usize,
    /// Items skipped because a resumed session already recorded them
    pub skipped: usize,
    /// Per-file admission rejections (the run continued without them)
    pub warnings: Vec<String>,
    /// The assembled archive; `None` when the run was aborted
    pub package: Option<Package>,
    pub elapsed: Duration,
}

/// The packaging pipeline entry point.
///
/// Owns a session store for crash recovery and a pressure monitor that
/// resizes the dispatch window while the run executes. One `Packager` can
/// execute any number of runs sequentially.
pub struct Packager<St, Sa> {
    config: JobConfig,
    store: St,
    monitor: PressureMonitor<Sa>,
    cancel: Arc<AtomicBool>,
}

impl<St: SessionStore, Sa: PressureSampler> Packager<St, Sa> {
    pub fn new(store: St, sampler: Sa) -> Self {
        Self::with_config(store, sampler, JobConfig::default())
    }

    pub fn with_config(store: St, sampler: Sa, config: JobConfig) -> Self {
        let monitor = PressureMonitor::new(sampler, config.policy.clone());
        Self {
            config,
            store,
            monitor,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between batches; setting it aborts the run at the next
    /// batch boundary without discarding recorded progress.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    /// Executes one packaging run end to end.
    ///
    /// With `resume`, the identified session's terminal items are skipped
    /// and the supplied file set must cover everything the session
    /// recorded; any missing file fails the resume closed.
    pub async fn run(
        &mut self,
        candidates: Vec<Candidate>,
        settings: &ProcessingSettings,
        resume: Option<Uuid>,
        sink: &dyn ProgressSink,
    ) -> PackagerResult<RunReport> {
        let started = Instant::now();
        let settings = admission::validate_settings(settings)?;

        sink.emit(ProgressEvent::new(0, 0, Stage::Validating, 0));
        let admission = admission::validate(candidates, &self.config.limits)?;
        let total = admission.admitted.len();
        let fingerprints: Vec<Fingerprint> =
            admission.admitted.iter().map(|i| i.fingerprint()).collect();

        let mut session = match resume {
            Some(id) => {
                let mut stored = self
                    .store
                    .load(id)?
                    .filter(|s| s.is_resumable(Utc::now()))
                    .ok_or(SessionError::NotResumable(id))?;
                stored.validate_resume(&fingerprints)?;
                // A superset supply is allowed; record the extra files so
                // the completed/failed sets stay subsets of the session's
                // fingerprint set
                stored.extend_fingerprints(&fingerprints);
                info!(
                    "Resuming session {id}: {} of {} item(s) already terminal",
                    stored.terminal_fingerprints().len(),
                    stored.fingerprints.len()
                );
                stored
            }
            None => Session::new(&settings.project_name, fingerprints),
        };

        let terminal: HashSet<Fingerprint> = session
            .terminal_fingerprints()
            .into_iter()
            .cloned()
            .collect();
        let pending: Vec<SourceItem> = admission
            .admitted
            .into_iter()
            .filter(|item| !terminal.contains(&item.fingerprint()))
            .collect();
        let mut state = BatchState::new(total - pending.len());

        session.revision += 1;
        self.store.checkpoint(&session)?;
        let mut last_checkpoint = Instant::now();

        info!(
            "Run started: session {}, {} pending of {} admitted",
            session.id, pending.len(), total
        );

        let policy = self.monitor.policy().clone();
        let mut batch_size = self
            .config
            .initial_batch_size
            .clamp(policy.min_batch_size, policy.max_batch_size);
        let shared_settings = Arc::new(settings.clone());
        let mut results: Vec<TransformResult> = Vec::with_capacity(pending.len());
        let mut cursor = 0;

        while cursor < pending.len() {
            if self.cancel.load(Ordering::Relaxed) {
                return self.abort(session, state, admission.warnings, total, started);
            }

            let end = (cursor + batch_size).min(pending.len());
            let batch_started = Instant::now();
            let mut workers = JoinSet::new();
            for item in &pending[cursor..end] {
                let item = item.clone();
                let settings = Arc::clone(&shared_settings);
                workers.spawn_blocking(move || transform::transform(&item, &settings));
            }

            while let Some(joined) = workers.join_next().await {
                let result =
                    joined.map_err(|e| PackagerError::Io(format!("worker task failed: {e}")))?;
                match &result.error {
                    Some(reason) => {
                        session.record_failed(result.fingerprint.clone(), reason.clone());
                        state.failed += 1;
                    }
                    None => {
                        session.record_completed(result.fingerprint.clone());
                        state.completed += 1;
                    }
                }
                sink.emit(
                    ProgressEvent::new(
                        state.skipped + state.terminal(),
                        total,
                        Stage::Processing,
                        elapsed_ms(started),
                    )
                    .with_item(result.source_name.clone()),
                );
                results.push(result);
            }
            let batch_elapsed = batch_started.elapsed();
            let item_latency = batch_elapsed / (end - cursor) as u32;
            state.record_batch(batch_elapsed);
            cursor = end;

            if last_checkpoint.elapsed() >= self.config.checkpoint_interval {
                session.revision += 1;
                self.store.checkpoint(&session)?;
                last_checkpoint = Instant::now();
            }

            if cursor < pending.len() {
                let adjustment = self.monitor.observe(batch_size, item_latency);
                batch_size = adjustment.batch_size;
                if adjustment.pause {
                    sink.pressure_warning(adjustment.ratio);
                    self.wait_for_headroom(policy.sample_interval).await;
                }
            }
        }

        sink.emit(ProgressEvent::new(
            total,
            total,
            Stage::Packaging,
            elapsed_ms(started),
        ));
        let package = match archive::assemble(&results, &settings) {
            Ok(package) => package,
            Err(e) => {
                // Fatal; record the aborted state best-effort so a store
                // failure cannot mask the archive error
                warn!("Archive assembly failed for session {}: {e}", session.id);
                self.record_aborted(&mut session);
                return Err(e);
            }
        };

        session.mark(SessionStatus::Completed);
        session.revision += 1;
        self.store.checkpoint(&session)?;

        sink.emit(ProgressEvent::new(
            total,
            total,
            Stage::Finalizing,
            elapsed_ms(started),
        ));
        info!(
            "Run completed: {} ok, {} failed, {} skipped, archive {} bytes",
            state.completed,
            state.failed,
            state.skipped,
            package.bytes.len()
        );

        Ok(RunReport {
            session_id: session.id,
            status: RunStatus::Completed,
            admitted: total,
            completed: state.completed,
            failed: state.failed,
            skipped: state.skipped,
            warnings: admission.warnings,
            package: Some(package),
            elapsed: started.elapsed(),
        })
    }

    /// Marks the session aborted and checkpoints it best-effort; callers
    /// on a failure path keep their original error.
    fn record_aborted(&self, session: &mut Session) {
        session.mark(SessionStatus::Aborted);
        session.revision += 1;
        if let Err(e) = self.store.checkpoint(session) {
            warn!("Could not record aborted session {}: {e}", session.id);
        }
    }

    /// Suspends dispatch until memory pressure recedes (or the run is
    /// cancelled).
    async fn wait_for_headroom(&mut self, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            if self.cancel.load(Ordering::Relaxed) || self.monitor.can_resume() {
                return;
            }
        }
    }

    fn abort(
        &self,
        mut session: Session,
        state: BatchState,
        warnings: Vec<String>,
        admitted: usize,
        started: Instant,
    ) -> PackagerResult<RunReport> {
        warn!(
            "Run cancelled: session {} aborted after {} terminal item(s)",
            session.id,
            state.terminal()
        );
        session.mark(SessionStatus::Aborted);
        session.revision += 1;
        self.store.checkpoint(&session)?;
        Ok(RunReport {
            session_id: session.id,
            status: RunStatus::Aborted,
            admitted,
            completed: state.completed,
            failed: state.failed,
            skipped: state.skipped,
            warnings,
            package: None,
            elapsed: started.elapsed(),
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
