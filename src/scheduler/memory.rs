//! Memory pressure sampling and the adaptive batch-size policy.
//!
//! The scheduler resizes its dispatch window from two signals: system
//! memory pressure (used/total) and observed batch latency against a
//! throughput target. Memory wins whenever the two disagree.

use std::time::Duration;

use sysinfo::System;
use tracing::{debug, warn};

/// Source of the memory pressure ratio. Injectable so tests can replay a
/// fixed sequence of readings.
pub trait PressureSampler: Send {
    /// Used/total memory as a ratio in `[0, 1]`.
    fn memory_ratio(&mut self) -> f64;
}

/// Samples real system memory through `sysinfo`.
pub struct SystemPressureSampler {
    system: System,
}

impl SystemPressureSampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SystemPressureSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl PressureSampler for SystemPressureSampler {
    fn memory_ratio(&mut self) -> f64 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        self.system.used_memory() as f64 / total as f64
    }
}

/// Thresholds and bounds for adaptive batch sizing.
#[derive(Debug, Clone)]
pub struct PressurePolicy {
    /// Above this ratio the batch size is halved
    pub high_watermark: f64,
    /// Below this ratio the batch size may grow
    pub low_watermark: f64,
    /// A paused run resumes once the ratio drops below this
    pub resume_below: f64,
    /// Growth multiplier applied under low pressure
    pub growth_factor: f64,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    /// Consecutive high samples before dispatch pauses
    pub pause_after: u32,
    /// Re-sample cadence while paused
    pub sample_interval: Duration,
    /// Target wall-clock time per item
    pub target_item_latency: Duration,
}

impl Default for PressurePolicy {
    fn default() -> Self {
        Self {
            high_watermark: 0.8,
            low_watermark: 0.5,
            resume_below: 0.7,
            growth_factor: 1.3,
            min_batch_size: 2,
            max_batch_size: 50,
            pause_after: 3,
            sample_interval: Duration::from_secs(5),
            target_item_latency: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Shrink,
    Hold,
    Grow,
}

/// Decision for the next batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub batch_size: usize,
    /// Dispatch should pause until pressure recedes
    pub pause: bool,
    pub ratio: f64,
}

/// Stateful monitor combining pressure samples and batch latency into
/// batch-size adjustments.
pub struct PressureMonitor<S> {
    sampler: S,
    policy: PressurePolicy,
    consecutive_high: u32,
}

impl<S: PressureSampler> PressureMonitor<S> {
    pub fn new(sampler: S, policy: PressurePolicy) -> Self {
        Self {
            sampler,
            policy,
            consecutive_high: 0,
        }
    }

    pub fn policy(&self) -> &PressurePolicy {
        &self.policy
    }

    /// Samples pressure after a batch and decides the next batch size.
    /// `item_latency` is the mean wall-clock time per item in the batch
    /// that just finished.
    pub fn observe(&mut self, current: usize, item_latency: Duration) -> Adjustment {
        let ratio = self.sampler.memory_ratio();

        let memory = if ratio > self.policy.high_watermark {
            Direction::Shrink
        } else if ratio < self.policy.low_watermark {
            Direction::Grow
        } else {
            Direction::Hold
        };
        let latency = self.latency_direction(item_latency);

        // Memory takes precedence over the throughput signal
        let resolved = match memory {
            Direction::Hold => latency,
            decisive => decisive,
        };

        if memory == Direction::Shrink {
            self.consecutive_high += 1;
        } else {
            self.consecutive_high = 0;
        }
        let pause = self.consecutive_high >= self.policy.pause_after;

        let batch_size = self.apply(current, resolved);
        if batch_size != current {
            debug!(
                "Batch size {current} -> {batch_size} (memory ratio {ratio:.2}, {item_latency:?} per item)"
            );
        }
        if pause {
            warn!(
                "Memory pressure {ratio:.2} high for {} consecutive sample(s), pausing dispatch",
                self.consecutive_high
            );
        }
        Adjustment {
            batch_size,
            pause,
            ratio,
        }
    }

    /// True once pressure has receded enough for a paused run to resume.
    pub fn can_resume(&mut self) -> bool {
        let ratio = self.sampler.memory_ratio();
        if ratio < self.policy.resume_below {
            self.consecutive_high = 0;
            true
        } else {
            false
        }
    }

    fn latency_direction(&self, item_latency: Duration) -> Direction {
        let target = self.policy.target_item_latency.as_secs_f64();
        let observed = item_latency.as_secs_f64();
        if observed > target * 1.5 {
            Direction::Shrink
        } else if observed < target * 0.5 {
            Direction::Grow
        } else {
            Direction::Hold
        }
    }

    fn apply(&self, current: usize, direction: Direction) -> usize {
        match direction {
            Direction::Shrink => (current / 2).max(self.policy.min_batch_size),
            Direction::Grow => {
                let grown = (current as f64 * self.policy.growth_factor).ceil() as usize;
                grown.min(self.policy.max_batch_size)
            }
            Direction::Hold => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed ratio sequence, repeating the last value.
    pub(crate) struct ScriptedSampler {
        readings: Vec<f64>,
        cursor: usize,
    }

    impl ScriptedSampler {
        pub(crate) fn new(readings: Vec<f64>) -> Self {
            Self {
                readings,
                cursor: 0,
            }
        }
    }

    impl PressureSampler for ScriptedSampler {
        fn memory_ratio(&mut self) -> f64 {
            let value = self.readings[self.cursor.min(self.readings.len() - 1)];
            self.cursor += 1;
            value
        }
    }

    fn on_target() -> Duration {
        Duration::from_secs(2)
    }

    #[test]
    fn test_high_pressure_halves_to_floor() {
        let mut monitor = PressureMonitor::new(
            ScriptedSampler::new(vec![0.9, 0.9, 0.9, 0.9]),
            PressurePolicy::default(),
        );
        let a = monitor.observe(10, on_target());
        assert_eq!(a.batch_size, 5);
        let a = monitor.observe(5, on_target());
        assert_eq!(a.batch_size, 2);
        // Never shrinks below the floor
        let a = monitor.observe(2, on_target());
        assert_eq!(a.batch_size, 2);
    }

    #[test]
    fn test_pressure_recovery_sequence() {
        // 0.9, 0.9 shrink twice; 0.6 is between watermarks and holds
        let mut monitor = PressureMonitor::new(
            ScriptedSampler::new(vec![0.9, 0.9, 0.6]),
            PressurePolicy::default(),
        );
        assert_eq!(monitor.observe(10, on_target()).batch_size, 5);
        assert_eq!(monitor.observe(5, on_target()).batch_size, 2);
        let a = monitor.observe(2, on_target());
        assert_eq!(a.batch_size, 2);
        assert!(!a.pause);
    }

    #[test]
    fn test_low_pressure_grows_to_ceiling() {
        let mut monitor = PressureMonitor::new(
            ScriptedSampler::new(vec![0.3]),
            PressurePolicy::default(),
        );
        assert_eq!(monitor.observe(10, on_target()).batch_size, 13);
        assert_eq!(monitor.observe(40, on_target()).batch_size, 50);
        assert_eq!(monitor.observe(50, on_target()).batch_size, 50);
    }

    #[test]
    fn test_pause_after_consecutive_high_and_resume() {
        let mut monitor = PressureMonitor::new(
            ScriptedSampler::new(vec![0.9, 0.9, 0.9, 0.75, 0.6]),
            PressurePolicy::default(),
        );
        assert!(!monitor.observe(10, on_target()).pause);
        assert!(!monitor.observe(5, on_target()).pause);
        assert!(monitor.observe(2, on_target()).pause);
        // Still above resume_below
        assert!(!monitor.can_resume());
        assert!(monitor.can_resume());
    }

    #[test]
    fn test_slow_items_shrink() {
        let mut monitor = PressureMonitor::new(
            ScriptedSampler::new(vec![0.6]),
            PressurePolicy::default(),
        );
        let a = monitor.observe(10, Duration::from_secs(4));
        assert_eq!(a.batch_size, 5);
    }

    #[test]
    fn test_fast_items_grow() {
        let mut monitor = PressureMonitor::new(
            ScriptedSampler::new(vec![0.6]),
            PressurePolicy::default(),
        );
        let a = monitor.observe(10, Duration::from_millis(500));
        assert_eq!(a.batch_size, 13);
    }

    #[test]
    fn test_memory_overrides_latency() {
        // Fast batch argues for growth; high memory pressure must win
        let mut monitor = PressureMonitor::new(
            ScriptedSampler::new(vec![0.9]),
            PressurePolicy::default(),
        );
        let a = monitor.observe(10, Duration::from_millis(100));
        assert_eq!(a.batch_size, 5);
    }
}
