//! Adaptive batch scheduling: run orchestration, memory pressure feedback
//! and dispatch-window sizing.

pub mod batch;
pub mod memory;
pub mod runner;

pub use memory::{PressureMonitor, PressurePolicy, PressureSampler, SystemPressureSampler};
pub use runner::{JobConfig, Packager, RunReport, RunStatus};
