//! Running counters for an in-flight packaging run.

use std::time::Duration;

/// Mutable progress state owned by the scheduler while a run executes.
#[derive(Debug, Default)]
pub struct BatchState {
    pub completed: usize,
    pub failed: usize,
    /// Items skipped because a resumed session already recorded them
    pub skipped: usize,
    batches: usize,
    processing_elapsed: Duration,
}

impl BatchState {
    pub fn new(skipped: usize) -> Self {
        Self {
            skipped,
            ..Default::default()
        }
    }

    pub fn record_batch(&mut self, elapsed: Duration) {
        self.batches += 1;
        self.processing_elapsed += elapsed;
    }

    /// Items that reached a terminal state in this run.
    pub fn terminal(&self) -> usize {
        self.completed + self.failed
    }

    pub fn mean_batch_latency(&self) -> Option<Duration> {
        if self.batches == 0 {
            return None;
        }
        Some(self.processing_elapsed / self.batches as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut state = BatchState::new(3);
        state.completed += 2;
        state.failed += 1;
        assert_eq!(state.terminal(), 3);
        assert_eq!(state.skipped, 3);
    }

    #[test]
    fn test_mean_latency() {
        let mut state = BatchState::default();
        assert_eq!(state.mean_batch_latency(), None);
        state.record_batch(Duration::from_secs(2));
        state.record_batch(Duration::from_secs(4));
        assert_eq!(state.mean_batch_latency(), Some(Duration::from_secs(3)));
    }
}
