//! Core types for source items, transform results and the final package.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Name+size identity used to match re-supplied files against a saved
/// session. Not cryptographically strong by design: source bytes are
/// re-supplied by the caller, the fingerprint only pairs them back up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(name: &str, size: u64) -> Self {
        Self(format!("{name}:{size}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate file presented at the input boundary, before admission.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Supplied filename (may contain path components; screened at admission)
    pub name: String,
    /// Declared media type, if the caller knows one
    pub media_type: Option<String>,
    /// Raw file bytes
    pub bytes: Bytes,
}

impl Candidate {
    pub fn new(name: impl Into<String>, media_type: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type,
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An admitted source file. Immutable once admitted; `index` is the
/// admitted order and drives deterministic output naming.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub name: String,
    pub size: u64,
    pub media_type: Option<String>,
    pub bytes: Bytes,
    pub index: usize,
}

impl SourceItem {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(&self.name, self.size)
    }
}

/// Logical destination folder inside the delivery archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FolderBucket {
    Originals,
    Raw,
    OptimizedJpg,
    OptimizedWebp,
    CompressedJpg,
    CompressedWebp,
}

impl FolderBucket {
    /// Path of this bucket relative to the project's top-level folder.
    pub fn relative_path(self) -> &'static str {
        match self {
            Self::Originals => "Export Originals",
            Self::Raw => "RAW Files",
            Self::OptimizedJpg => "Optimized Files/Optimized JPGs",
            Self::OptimizedWebp => "Optimized Files/Optimized WebPs",
            Self::CompressedJpg => "Compressed Files/Compressed JPGs",
            Self::CompressedWebp => "Compressed Files/Compressed WebPs",
        }
    }
}

/// Encoding of a produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    Jpeg,
    Webp,
    /// Source bytes passed through unchanged (originals, RAW)
    Original,
}

/// One encoded output file derived from a source item.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Destination bucket inside the archive
    pub bucket: FolderBucket,
    /// Source-derived filename; the assembler replaces it with the
    /// sequence-numbered delivery name
    pub file_name: String,
    /// Encoded bytes, exclusively owned by the run until archived
    pub bytes: Bytes,
    pub encoding: EncodingKind,
}

impl Artifact {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Outcome of transforming one source item.
///
/// The transformer never returns `Err` for expected failure modes; a
/// per-item failure is captured in `error` and the run continues.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub index: usize,
    pub source_name: String,
    pub fingerprint: Fingerprint,
    pub artifacts: Vec<Artifact>,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl TransformResult {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// The final assembled archive plus summary statistics. Immutable.
#[derive(Debug, Clone)]
pub struct Package {
    /// Compressed archive bytes
    pub bytes: Vec<u8>,
    /// Number of files inside the archive
    pub file_count: usize,
    /// Sum of uncompressed file bytes
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_identity() {
        let a = Fingerprint::new("shoot.jpg", 1024);
        let b = Fingerprint::new("shoot.jpg", 1024);
        let c = Fingerprint::new("shoot.jpg", 1025);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "shoot.jpg:1024");
    }

    #[test]
    fn test_bucket_paths_are_distinct() {
        use std::collections::HashSet;
        let buckets = [
            FolderBucket::Originals,
            FolderBucket::Raw,
            FolderBucket::OptimizedJpg,
            FolderBucket::OptimizedWebp,
            FolderBucket::CompressedJpg,
            FolderBucket::CompressedWebp,
        ];
        let paths: HashSet<_> = buckets.iter().map(|b| b.relative_path()).collect();
        assert_eq!(paths.len(), buckets.len());
    }
}
