//! Streaming batch photo transform and delivery packaging.
//!
//! Takes a client-supplied set of photo files, screens them through
//! admission control, transforms each into the configured output variants
//! (optimized and compressed JPEG/WebP tiers, original and RAW
//! pass-through), and assembles everything into a deterministic ZIP
//! delivery archive with a generated manifest.
//!
//! The scheduler processes items in adaptive batches: system memory
//! pressure and observed batch latency resize the dispatch window while
//! the run executes, and lightweight session checkpoints make interrupted
//! runs resumable.
//!
//! ```no_run
//! use photopack::{Candidate, NullSink, Packager, ProcessingSettings};
//! use photopack::scheduler::SystemPressureSampler;
//! use photopack::session::file_store::FileSessionStore;
//!
//! # async fn demo() -> photopack::PackagerResult<()> {
//! let store = FileSessionStore::new("/var/lib/photopack/sessions")?;
//! let mut packager = Packager::new(store, SystemPressureSampler::new());
//!
//! let settings = ProcessingSettings {
//!     project_name: "Wedding 2026".into(),
//!     ..Default::default()
//! };
//! let candidates = vec![Candidate::new("photo.jpg", None, std::fs::read("photo.jpg")?)];
//! let report = packager.run(candidates, &settings, None, &NullSink).await?;
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod archive;
pub mod core;
pub mod scheduler;
pub mod session;
pub mod transform;
pub mod utils;

pub use admission::{Admission, AdmissionLimits, RejectReason, RejectedFile};
pub use crate::core::{
    Candidate, Fingerprint, FnSink, NullSink, Package, ProcessingSettings, ProgressEvent,
    ProgressSink, SourceItem, Stage, StudioInfo, TransformResult,
};
pub use scheduler::{JobConfig, Packager, PressurePolicy, RunReport, RunStatus};
pub use session::{Session, SessionStatus, SessionStore};
pub use utils::{AdmissionError, PackagerError, PackagerResult, SessionError, SettingsError};
