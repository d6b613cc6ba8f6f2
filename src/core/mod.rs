// Core data model shared across the pipeline
pub mod progress;
pub mod settings;
pub mod types;

pub use progress::{FnSink, NullSink, ProgressEvent, ProgressSink, Stage};
pub use settings::{
    InclusionAction, MetadataPolicy, ProcessingSettings, StudioInfo,
};
pub use types::{
    Artifact, Candidate, EncodingKind, Fingerprint, FolderBucket, Package, SourceItem,
    TransformResult,
};
