//! Per-item image transformation: decode once, emit the enabled output
//! variants as in-memory byte buffers.
//!
//! `transform` never returns an error for expected failure modes
//! (undecodable input, encode failure); those are captured on the
//! [`TransformResult`] so a single bad file cannot abort a batch.

pub mod metadata;
pub mod resize;

use std::time::Instant;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::{debug, warn};

use crate::admission::formats;
use crate::core::{
    Artifact, EncodingKind, FolderBucket, ProcessingSettings, SourceItem, TransformResult,
};
use crate::utils::{extract_filename, extension_of, file_stem};

/// Transforms one admitted item into its configured output artifacts.
///
/// RAW files are never decoded: they are optionally copied through
/// unchanged. For decodable raster formats every enabled toggle yields one
/// re-encoded artifact; the compressed tier is downscaled first. Decode
/// surfaces are dropped as soon as the last artifact referencing them has
/// been encoded.
pub fn transform(item: &SourceItem, settings: &ProcessingSettings) -> TransformResult {
    let started = Instant::now();
    let ext = extension_of(&item.name).unwrap_or_default();
    let mut artifacts = Vec::new();

    if formats::is_raw_extension(&ext) {
        if settings.copies_raw() {
            artifacts.push(pass_through(item, FolderBucket::Raw));
        }
        return completed(item, artifacts, started);
    }

    if settings.copies_originals() {
        artifacts.push(pass_through(item, FolderBucket::Originals));
    }

    let wants_variants = settings.generate_optimized_jpg
        || settings.generate_optimized_webp
        || settings.generate_compressed_jpg
        || settings.generate_compressed_webp;
    if !wants_variants {
        return completed(item, artifacts, started);
    }

    match produce_variants(item, settings, &ext) {
        Ok(mut variants) => {
            artifacts.append(&mut variants);
            completed(item, artifacts, started)
        }
        Err(reason) => {
            warn!("Transform failed for '{}': {}", item.name, reason);
            TransformResult {
                index: item.index,
                source_name: item.name.clone(),
                fingerprint: item.fingerprint(),
                artifacts: Vec::new(),
                error: Some(reason),
                elapsed: started.elapsed(),
            }
        }
    }
}

fn completed(item: &SourceItem, artifacts: Vec<Artifact>, started: Instant) -> TransformResult {
    debug!(
        "Transformed '{}': {} artifact(s) in {:?}",
        item.name,
        artifacts.len(),
        started.elapsed()
    );
    TransformResult {
        index: item.index,
        source_name: item.name.clone(),
        fingerprint: item.fingerprint(),
        artifacts,
        error: None,
        elapsed: started.elapsed(),
    }
}

fn pass_through(item: &SourceItem, bucket: FolderBucket) -> Artifact {
    Artifact {
        bucket,
        file_name: extract_filename(&item.name).to_string(),
        bytes: item.bytes.clone(),
        encoding: EncodingKind::Original,
    }
}

fn produce_variants(
    item: &SourceItem,
    settings: &ProcessingSettings,
    ext: &str,
) -> Result<Vec<Artifact>, String> {
    let decoded = image::load_from_memory(&item.bytes)
        .map_err(|e| format!("undecodable input: {e}"))?;

    let raw_exif = metadata::extract(&item.bytes, ext);
    let orientation = raw_exif.as_deref().and_then(metadata::orientation);
    let surface = metadata::apply_orientation(decoded, orientation);
    let exif = metadata::apply_policy(raw_exif, settings.metadata_policy);

    let stem = file_stem(&item.name);
    let mut artifacts = Vec::new();

    if settings.generate_optimized_jpg {
        let encoded = encode_jpeg(&surface, settings.optimized_quality)?;
        artifacts.push(Artifact {
            bucket: FolderBucket::OptimizedJpg,
            file_name: format!("{stem}.jpg"),
            bytes: Bytes::from(metadata::embed_jpeg(encoded, exif.as_ref())),
            encoding: EncodingKind::Jpeg,
        });
    }
    if settings.generate_optimized_webp {
        let encoded = encode_webp(&surface, settings.optimized_quality)?;
        artifacts.push(Artifact {
            bucket: FolderBucket::OptimizedWebp,
            file_name: format!("{stem}.webp"),
            bytes: Bytes::from(metadata::embed_webp(encoded, exif.as_ref())),
            encoding: EncodingKind::Webp,
        });
    }

    if settings.generate_compressed_jpg || settings.generate_compressed_webp {
        // Consumes the full-size surface; only the downscaled copy stays live.
        let compressed = resize::downscale(surface, settings.compressed_max_dimension);

        if settings.generate_compressed_jpg {
            let encoded = encode_jpeg(&compressed, settings.compressed_quality)?;
            artifacts.push(Artifact {
                bucket: FolderBucket::CompressedJpg,
                file_name: format!("{stem}.jpg"),
                bytes: Bytes::from(metadata::embed_jpeg(encoded, exif.as_ref())),
                encoding: EncodingKind::Jpeg,
            });
        }
        if settings.generate_compressed_webp {
            let encoded = encode_webp(&compressed, settings.compressed_quality)?;
            artifacts.push(Artifact {
                bucket: FolderBucket::CompressedWebp,
                file_name: format!("{stem}.webp"),
                bytes: Bytes::from(metadata::embed_webp(encoded, exif.as_ref())),
                encoding: EncodingKind::Webp,
            });
        }
    }

    Ok(artifacts)
}

/// Encodes as baseline JPEG at the given quality. Alpha is flattened
/// since JPEG has no transparency.
fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| format!("JPEG encode failed: {e}"))?;
    Ok(buf.into_inner())
}

/// Encodes as lossy WebP at the given quality.
fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
    let encoder =
        webp::Encoder::from_image(&rgba).map_err(|e| format!("WebP encode failed: {e}"))?;
    Ok(encoder.encode(f32::from(quality)).to_vec())
}
