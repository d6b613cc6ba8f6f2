//! Admission control: per-file screening, aggregate batch ceilings and
//! structural settings validation.
//!
//! Admission is the one-time gate a file must pass before entering the
//! pipeline. Per-file violations reject only that file and surface as
//! warnings; aggregate violations reject the entire batch before any
//! processing resource is committed.

pub mod formats;

use std::fmt;
use std::path::{Component, Path};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{Candidate, ProcessingSettings, SourceItem};
use crate::utils::{extension_of, AdmissionError, SettingsError};

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

const MAX_PROJECT_NAME_LEN: usize = 120;
const MAX_STUDIO_FIELD_LEN: usize = 200;

/// Configurable batch ceilings.
#[derive(Debug, Clone)]
pub struct AdmissionLimits {
    /// Per-file byte ceiling
    pub max_file_bytes: u64,
    /// Admitted file count ceiling
    pub max_files: usize,
    /// Total admitted byte ceiling
    pub max_total_bytes: u64,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 500 * MIB,
            max_files: 2000,
            max_total_bytes: 10 * GIB,
        }
    }
}

/// Why a single candidate was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    Oversized,
    UnsafePath,
    UnsupportedFormat,
    TypeMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Oversized => "oversized",
            Self::UnsafePath => "unsafe-path",
            Self::UnsupportedFormat => "unsupported-format",
            Self::TypeMismatch => "type-mismatch",
        };
        f.write_str(s)
    }
}

/// A rejected candidate with its reason.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedFile {
    pub name: String,
    pub reason: RejectReason,
}

/// Outcome of batch admission.
#[derive(Debug)]
pub struct Admission {
    pub admitted: Vec<SourceItem>,
    pub rejected: Vec<RejectedFile>,
    pub warnings: Vec<String>,
}

/// Screens candidates and admits those passing all per-file checks, then
/// enforces the aggregate ceilings over the admitted set.
///
/// Per-file checks run in order and short-circuit on the first failure:
/// size, path safety, extension allow-list, declared media type.
pub fn validate(
    candidates: Vec<Candidate>,
    limits: &AdmissionLimits,
) -> Result<Admission, AdmissionError> {
    let mut admitted = Vec::with_capacity(candidates.len());
    let mut rejected = Vec::new();
    let mut warnings = Vec::new();
    let mut total_bytes: u64 = 0;

    for candidate in candidates {
        match screen_file(&candidate, limits) {
            Ok(()) => {
                total_bytes += candidate.size();
                let index = admitted.len();
                admitted.push(SourceItem {
                    size: candidate.size(),
                    name: candidate.name,
                    media_type: candidate.media_type,
                    bytes: candidate.bytes,
                    index,
                });
            }
            Err(reason) => {
                warn!("Rejected '{}': {}", candidate.name, reason);
                warnings.push(format!("'{}' rejected: {}", candidate.name, reason));
                rejected.push(RejectedFile {
                    name: candidate.name,
                    reason,
                });
            }
        }
    }

    // Aggregate ceilings reject the whole batch, evaluated before any
    // processing resource is committed.
    if admitted.len() > limits.max_files {
        return Err(AdmissionError::TooManyFiles {
            count: admitted.len(),
            limit: limits.max_files,
        });
    }
    if total_bytes > limits.max_total_bytes {
        return Err(AdmissionError::BatchTooLarge {
            bytes: total_bytes,
            limit: limits.max_total_bytes,
        });
    }

    info!(
        "Admission complete: {} admitted ({} bytes), {} rejected",
        admitted.len(),
        total_bytes,
        rejected.len()
    );
    Ok(Admission {
        admitted,
        rejected,
        warnings,
    })
}

fn screen_file(candidate: &Candidate, limits: &AdmissionLimits) -> Result<(), RejectReason> {
    if candidate.size() > limits.max_file_bytes {
        return Err(RejectReason::Oversized);
    }
    if !is_safe_path(&candidate.name) {
        return Err(RejectReason::UnsafePath);
    }
    let ext = extension_of(&candidate.name).ok_or(RejectReason::UnsupportedFormat)?;
    if !formats::is_allowed_extension(&ext) {
        return Err(RejectReason::UnsupportedFormat);
    }
    if let Some(media_type) = &candidate.media_type {
        if !formats::is_raw_extension(&ext) && !formats::media_type_matches(&ext, media_type) {
            return Err(RejectReason::TypeMismatch);
        }
    }
    Ok(())
}

/// Rejects names with traversal sequences, NUL bytes, or absolute roots.
fn is_safe_path(name: &str) -> bool {
    if name.is_empty() || name.contains('\0') {
        return false;
    }
    // Backslashes are treated as separators on Windows only; screen them
    // portably so "..\\" cannot slip through on Unix hosts.
    if name.split(['/', '\\']).any(|seg| seg == "..") {
        return false;
    }
    if name.starts_with(['/', '\\']) {
        return false;
    }
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Range-checks and sanitizes settings, returning a normalized copy.
///
/// Only the project name is mandatory; optional fields keep their values
/// (or defaults) after character/length sanitization. Rejects a settings
/// combination that would produce no output at all, before any transform
/// runs.
pub fn validate_settings(
    settings: &ProcessingSettings,
) -> Result<ProcessingSettings, SettingsError> {
    use crate::core::settings::*;

    let project_name = sanitize_name(&settings.project_name, MAX_PROJECT_NAME_LEN);
    if project_name.is_empty() {
        return Err(SettingsError::MissingProjectName);
    }

    if !(OPTIMIZED_QUALITY_MIN..=OPTIMIZED_QUALITY_MAX).contains(&settings.optimized_quality) {
        return Err(SettingsError::QualityOutOfRange {
            tier: "optimized",
            value: settings.optimized_quality,
            min: OPTIMIZED_QUALITY_MIN,
            max: OPTIMIZED_QUALITY_MAX,
        });
    }
    if !(COMPRESSED_QUALITY_MIN..=COMPRESSED_QUALITY_MAX).contains(&settings.compressed_quality) {
        return Err(SettingsError::QualityOutOfRange {
            tier: "compressed",
            value: settings.compressed_quality,
            min: COMPRESSED_QUALITY_MIN,
            max: COMPRESSED_QUALITY_MAX,
        });
    }
    if !ALLOWED_MAX_DIMENSIONS.contains(&settings.compressed_max_dimension) {
        return Err(SettingsError::InvalidMaxDimension(
            settings.compressed_max_dimension,
        ));
    }
    if !settings.produces_output() {
        return Err(SettingsError::NoOutputSelected);
    }

    let mut normalized = settings.clone();
    normalized.project_name = project_name;
    normalized.studio.name = sanitize_field(&settings.studio.name, MAX_STUDIO_FIELD_LEN);
    normalized.studio.website = sanitize_field(&settings.studio.website, MAX_STUDIO_FIELD_LEN);
    normalized.studio.support_email =
        sanitize_field(&settings.studio.support_email, MAX_STUDIO_FIELD_LEN);

    debug!("Settings validated for project '{}'", normalized.project_name);
    Ok(normalized)
}

/// Strips control characters and filesystem-reserved characters; the
/// project name becomes a folder name and a filename component.
fn sanitize_name(raw: &str, max_len: usize) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    truncate_chars(cleaned.trim(), max_len)
}

fn sanitize_field(raw: &str, max_len: usize) -> String {
    let cleaned: String = raw.trim().chars().filter(|c| !c.is_control()).collect();
    truncate_chars(&cleaned, max_len)
}

fn truncate_chars(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InclusionAction, ProcessingSettings};
    use bytes::Bytes;

    fn candidate(name: &str, len: usize) -> Candidate {
        Candidate::new(name, None, Bytes::from(vec![0u8; len]))
    }

    fn settings() -> ProcessingSettings {
        ProcessingSettings {
            project_name: "Shoot".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_oversized_file() {
        let limits = AdmissionLimits {
            max_file_bytes: 10,
            ..Default::default()
        };
        let out = validate(vec![candidate("big.jpg", 11)], &limits).unwrap();
        assert!(out.admitted.is_empty());
        assert_eq!(out.rejected[0].reason, RejectReason::Oversized);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_rejects_traversal_and_nul() {
        let limits = AdmissionLimits::default();
        let out = validate(
            vec![
                candidate("../etc/passwd.jpg", 4),
                candidate("a\0b.jpg", 4),
                candidate("/abs.jpg", 4),
                candidate("..\\win.jpg", 4),
            ],
            &limits,
        )
        .unwrap();
        assert!(out.admitted.is_empty());
        assert!(out
            .rejected
            .iter()
            .all(|r| r.reason == RejectReason::UnsafePath));
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let out = validate(
            vec![candidate("malware.exe", 4), candidate("notes.txt", 4)],
            &AdmissionLimits::default(),
        )
        .unwrap();
        assert!(out.admitted.is_empty());
        assert!(out
            .rejected
            .iter()
            .all(|r| r.reason == RejectReason::UnsupportedFormat));
    }

    #[test]
    fn test_type_mismatch_skipped_for_raw() {
        let mismatched = Candidate::new(
            "photo.jpg",
            Some("image/png".into()),
            Bytes::from_static(b"xx"),
        );
        let raw = Candidate::new(
            "photo.cr2",
            Some("application/octet-stream".into()),
            Bytes::from_static(b"xx"),
        );
        let out = validate(vec![mismatched, raw], &AdmissionLimits::default()).unwrap();
        assert_eq!(out.admitted.len(), 1);
        assert_eq!(out.admitted[0].name, "photo.cr2");
        assert_eq!(out.rejected[0].reason, RejectReason::TypeMismatch);
    }

    #[test]
    fn test_aggregate_count_ceiling_rejects_batch() {
        let limits = AdmissionLimits {
            max_files: 2,
            ..Default::default()
        };
        let files = vec![
            candidate("a.jpg", 4),
            candidate("b.jpg", 4),
            candidate("c.jpg", 4),
        ];
        let err = validate(files, &limits).unwrap_err();
        assert_eq!(err, AdmissionError::TooManyFiles { count: 3, limit: 2 });
    }

    #[test]
    fn test_aggregate_byte_ceiling_rejects_batch() {
        let limits = AdmissionLimits {
            max_total_bytes: 10,
            ..Default::default()
        };
        let err = validate(vec![candidate("a.jpg", 6), candidate("b.jpg", 6)], &limits)
            .unwrap_err();
        assert!(matches!(err, AdmissionError::BatchTooLarge { bytes: 12, .. }));
    }

    #[test]
    fn test_admitted_indices_are_sequential() {
        let out = validate(
            vec![
                candidate("a.jpg", 4),
                candidate("bad.exe", 4),
                candidate("b.jpg", 4),
            ],
            &AdmissionLimits::default(),
        )
        .unwrap();
        let indices: Vec<_> = out.admitted.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_settings_quality_range() {
        let mut s = settings();
        s.optimized_quality = 96;
        assert!(matches!(
            validate_settings(&s),
            Err(SettingsError::QualityOutOfRange { tier: "optimized", .. })
        ));
        let mut s = settings();
        s.compressed_quality = 29;
        assert!(matches!(
            validate_settings(&s),
            Err(SettingsError::QualityOutOfRange { tier: "compressed", .. })
        ));
    }

    #[test]
    fn test_settings_max_dimension_enumerated() {
        let mut s = settings();
        s.compressed_max_dimension = 2000;
        assert_eq!(
            validate_settings(&s),
            Err(SettingsError::InvalidMaxDimension(2000))
        );
    }

    #[test]
    fn test_settings_no_output_selected() {
        let s = ProcessingSettings {
            project_name: "Shoot".into(),
            generate_optimized_jpg: false,
            generate_optimized_webp: false,
            generate_compressed_jpg: false,
            generate_compressed_webp: false,
            originals_action: InclusionAction::Leave,
            raw_action: InclusionAction::Leave,
            ..Default::default()
        };
        assert_eq!(validate_settings(&s), Err(SettingsError::NoOutputSelected));
    }

    #[test]
    fn test_settings_name_sanitized() {
        let mut s = settings();
        s.project_name = "  Client/Shoot: 2026?  ".into();
        let normalized = validate_settings(&s).unwrap();
        assert_eq!(normalized.project_name, "ClientShoot 2026");
    }

    #[test]
    fn test_settings_missing_name() {
        let mut s = settings();
        s.project_name = "   ".into();
        assert_eq!(validate_settings(&s), Err(SettingsError::MissingProjectName));
    }
}
