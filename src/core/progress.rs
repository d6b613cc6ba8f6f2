//! Progress reporting surface for embedding callers.
//!
//! The pipeline never reaches into shared global state; callers inject a
//! [`ProgressSink`] and receive events through it.

use serde::Serialize;

/// Pipeline stage marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Validating,
    Processing,
    Packaging,
    Finalizing,
}

/// A single progress update.
///
/// Emitted at least once per completed item and once per stage transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Number of items that reached a terminal state
    pub completed: usize,
    /// Total admitted items
    pub total: usize,
    /// Progress percentage (0-100)
    pub percent: usize,
    /// Name of the item that just finished, when applicable
    pub current_item: Option<String>,
    pub stage: Stage,
    /// Wall-clock time since the run started, in milliseconds
    pub elapsed_ms: u64,
}

impl ProgressEvent {
    pub fn new(completed: usize, total: usize, stage: Stage, elapsed_ms: u64) -> Self {
        let percent = if total > 0 { (completed * 100) / total } else { 0 };
        Self {
            completed,
            total,
            percent,
            current_item: None,
            stage,
            elapsed_ms,
        }
    }

    pub fn with_item(mut self, name: impl Into<String>) -> Self {
        self.current_item = Some(name.into());
        self
    }
}

/// Injected observer for progress and throttling notifications.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);

    /// Called when memory pressure stays high enough to pause dispatch.
    /// The run is suspended, not failed; default implementation ignores it.
    fn pressure_warning(&self, ratio: f64) {
        let _ = ratio;
    }
}

/// Adapts a closure into a [`ProgressSink`].
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        (self.0)(event)
    }
}

/// Sink that discards all events.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_calculation() {
        let ev = ProgressEvent::new(3, 12, Stage::Processing, 0);
        assert_eq!(ev.percent, 25);
        let ev = ProgressEvent::new(0, 0, Stage::Validating, 0);
        assert_eq!(ev.percent, 0);
    }

    #[test]
    fn test_closure_sink() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static SEEN: AtomicUsize = AtomicUsize::new(0);
        let sink = FnSink(|_ev: ProgressEvent| {
            SEEN.fetch_add(1, Ordering::Relaxed);
        });
        sink.emit(ProgressEvent::new(1, 2, Stage::Processing, 5));
        assert_eq!(SEEN.load(Ordering::Relaxed), 1);
    }
}
