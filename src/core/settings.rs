//! Run configuration: a strongly-typed settings struct validated once at
//! construction and treated as immutable for the whole run.

use serde::{Deserialize, Serialize};

/// Closed quality range for the optimized (higher fidelity) tier.
pub const OPTIMIZED_QUALITY_MIN: u8 = 60;
pub const OPTIMIZED_QUALITY_MAX: u8 = 95;

/// Closed quality range for the compressed (downscaled) tier.
pub const COMPRESSED_QUALITY_MIN: u8 = 30;
pub const COMPRESSED_QUALITY_MAX: u8 = 80;

/// Allowed longer-edge limits for the compressed tier.
pub const ALLOWED_MAX_DIMENSIONS: [u32; 5] = [1024, 1600, 2048, 2560, 3840];

pub const DEFAULT_OPTIMIZED_QUALITY: u8 = 90;
pub const DEFAULT_COMPRESSED_QUALITY: u8 = 60;
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// What to do with original/RAW source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionAction {
    /// Copy the unmodified source into the delivery archive
    Copy,
    /// Leave the source out of the archive entirely
    Leave,
}

/// Metadata retention policy applied to re-encoded outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataPolicy {
    /// Embed the source metadata verbatim where the encoding supports it
    Preserve,
    /// Drop all embedded metadata
    StripAll,
    /// Remove capture/modification date fields
    StripDate,
    /// Remove camera, lens and software fields
    StripCamera,
    /// Remove both date and camera fields
    StripDateAndCamera,
}

impl MetadataPolicy {
    pub fn strips_date(self) -> bool {
        matches!(self, Self::StripDate | Self::StripDateAndCamera)
    }

    pub fn strips_camera(self) -> bool {
        matches!(self, Self::StripCamera | Self::StripDateAndCamera)
    }
}

/// Studio display fields used in the delivery manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioInfo {
    /// Display name for the delivering studio
    pub name: String,
    /// Studio website URL
    pub website: String,
    /// Support contact email
    pub support_email: String,
}

/// Configuration for a packaging run.
///
/// Use [`crate::admission::validate_settings`] to obtain a sanitized,
/// range-checked copy before starting a run; only the project name is
/// mandatory, every other field falls back to its documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingSettings {
    /// Name of the shoot/project; becomes the archive's top-level folder
    pub project_name: String,
    /// Studio contact fields for the manifest footer
    pub studio: StudioInfo,
    /// Quality for the optimized tier (60-95)
    pub optimized_quality: u8,
    /// Quality for the compressed tier (30-80)
    pub compressed_quality: u8,
    /// Longer-edge limit for the compressed tier
    pub compressed_max_dimension: u32,
    /// Whether unmodified originals are part of the delivery
    pub include_originals: bool,
    /// How originals are handled when included
    pub originals_action: InclusionAction,
    /// Whether camera-RAW files are part of the delivery
    pub include_raw: bool,
    /// How RAW files are handled when included
    pub raw_action: InclusionAction,
    /// Produce high-fidelity JPEGs
    pub generate_optimized_jpg: bool,
    /// Produce high-fidelity WebPs
    pub generate_optimized_webp: bool,
    /// Produce downscaled JPEGs
    pub generate_compressed_jpg: bool,
    /// Produce downscaled WebPs
    pub generate_compressed_webp: bool,
    /// Metadata retention policy for re-encoded outputs
    pub metadata_policy: MetadataPolicy,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            studio: StudioInfo::default(),
            optimized_quality: DEFAULT_OPTIMIZED_QUALITY,
            compressed_quality: DEFAULT_COMPRESSED_QUALITY,
            compressed_max_dimension: DEFAULT_MAX_DIMENSION,
            include_originals: true,
            originals_action: InclusionAction::Copy,
            include_raw: true,
            raw_action: InclusionAction::Copy,
            generate_optimized_jpg: true,
            generate_optimized_webp: true,
            generate_compressed_jpg: true,
            generate_compressed_webp: true,
            metadata_policy: MetadataPolicy::Preserve,
        }
    }
}

impl ProcessingSettings {
    /// True when originals pass through into the archive.
    pub fn copies_originals(&self) -> bool {
        self.include_originals && self.originals_action == InclusionAction::Copy
    }

    /// True when RAW files pass through into the archive.
    pub fn copies_raw(&self) -> bool {
        self.include_raw && self.raw_action == InclusionAction::Copy
    }

    /// True when the run would produce at least one output file.
    pub fn produces_output(&self) -> bool {
        self.generate_optimized_jpg
            || self.generate_optimized_webp
            || self.generate_compressed_jpg
            || self.generate_compressed_webp
            || self.copies_originals()
            || self.copies_raw()
    }
}
