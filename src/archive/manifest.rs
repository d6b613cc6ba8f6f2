//! Delivery manifest (README) text.
//!
//! Output depends only on settings and the set of folders actually present
//! in the archive, so the same run inputs always produce the same text.

use crate::core::{FolderBucket, ProcessingSettings};

/// Every bucket in its archive presentation order.
pub const BUCKET_ORDER: [FolderBucket; 6] = [
    FolderBucket::Originals,
    FolderBucket::Raw,
    FolderBucket::OptimizedJpg,
    FolderBucket::OptimizedWebp,
    FolderBucket::CompressedJpg,
    FolderBucket::CompressedWebp,
];

fn bucket_description(bucket: FolderBucket) -> &'static str {
    match bucket {
        FolderBucket::Originals => "Untouched source files, exactly as supplied.",
        FolderBucket::Raw => "Camera RAW files, copied without modification.",
        FolderBucket::OptimizedJpg => {
            "Full-resolution JPEGs, lightly re-encoded. Best for print and archival."
        }
        FolderBucket::OptimizedWebp => {
            "Full-resolution WebPs, lightly re-encoded. Best for modern web use at full quality."
        }
        FolderBucket::CompressedJpg => {
            "Downscaled JPEGs. Best for email, messaging and quick sharing."
        }
        FolderBucket::CompressedWebp => {
            "Downscaled WebPs. Smallest files, best for web galleries and social media."
        }
    }
}

/// Builds the top-level README placed at the root of the project folder.
///
/// Only folders that actually exist in this delivery get a section.
pub fn build_readme(settings: &ProcessingSettings, present: &[FolderBucket]) -> String {
    let mut out = String::new();
    let project = &settings.project_name;

    out.push_str(project);
    out.push('\n');
    out.push_str(&"=".repeat(project.chars().count().max(4)));
    out.push_str("\n\n");
    out.push_str("Thank you for your order! This folder contains your delivered photos.\n\n");

    out.push_str("Contents\n--------\n");
    for bucket in BUCKET_ORDER {
        if !present.contains(&bucket) {
            continue;
        }
        out.push_str(bucket.relative_path());
        out.push_str("/\n    ");
        out.push_str(bucket_description(bucket));
        out.push('\n');
    }
    out.push('\n');

    out.push_str("File naming\n-----------\n");
    out.push_str(&format!(
        "Files are numbered in delivery order: 001-{project}, 002-{project} and so on.\n\
         The same number across folders always refers to the same photo.\n\n"
    ));

    let studio = &settings.studio;
    if !studio.name.is_empty() || !studio.website.is_empty() || !studio.support_email.is_empty() {
        out.push_str("Questions?\n----------\n");
        if !studio.name.is_empty() {
            out.push_str(&studio.name);
            out.push('\n');
        }
        if !studio.website.is_empty() {
            out.push_str(&studio.website);
            out.push('\n');
        }
        if !studio.support_email.is_empty() {
            out.push_str(&studio.support_email);
            out.push('\n');
        }
    }

    out
}

/// Short note dropped inside the RAW folder.
pub fn raw_readme() -> &'static str {
    "These are the unprocessed camera RAW files.\n\
     They require dedicated software (Lightroom, Capture One, darktable)\n\
     to open and are included for archival purposes.\n"
}
