//! EXIF handling: extraction from source bytes, policy-driven filtering,
//! orientation correction, and re-embedding into encoded outputs.
//!
//! Selective stripping parses the EXIF block and rebuilds it without the
//! targeted tags; if the block cannot be parsed or rebuilt, the fallback is
//! to strip everything rather than ship metadata the caller asked to remove.

use bytes::Bytes;
use exif::{In, Reader, Tag};
use image::DynamicImage;
use img_parts::jpeg::Jpeg;
use img_parts::webp::WebP;
use img_parts::ImageEXIF;
use tracing::{debug, warn};

use crate::core::MetadataPolicy;

const DATE_TAGS: &[Tag] = &[Tag::DateTime, Tag::DateTimeOriginal, Tag::DateTimeDigitized];
const CAMERA_TAGS: &[Tag] = &[
    Tag::Make,
    Tag::Model,
    Tag::Software,
    Tag::LensMake,
    Tag::LensModel,
    Tag::LensSpecification,
];

/// Pulls the raw EXIF block out of a JPEG or WebP source, if present.
pub fn extract(source: &Bytes, ext: &str) -> Option<Bytes> {
    match ext {
        "jpg" | "jpeg" | "jpe" | "jfif" => Jpeg::from_bytes(source.clone())
            .ok()
            .and_then(|jpeg| jpeg.exif()),
        "webp" => WebP::from_bytes(source.clone())
            .ok()
            .and_then(|webp| webp.exif()),
        _ => None,
    }
}

/// Applies the retention policy to an extracted EXIF block.
///
/// Returns the block to embed into re-encoded outputs, or `None` when
/// nothing should be embedded.
pub fn apply_policy(exif: Option<Bytes>, policy: MetadataPolicy) -> Option<Bytes> {
    let exif = exif?;
    match policy {
        MetadataPolicy::Preserve => Some(exif),
        MetadataPolicy::StripAll => None,
        _ => match strip_selected(&exif, policy.strips_date(), policy.strips_camera()) {
            Some(filtered) => Some(Bytes::from(filtered)),
            None => {
                // Parse or rebuild failed: stripping everything is the safe
                // direction for a policy that asked for removal.
                warn!("Partial EXIF strip failed, stripping all metadata instead");
                None
            }
        },
    }
}

/// Rebuilds the EXIF block without the targeted date/camera tags.
/// `None` on any parse or write failure.
fn strip_selected(raw: &[u8], strip_date: bool, strip_camera: bool) -> Option<Vec<u8>> {
    let parsed = Reader::new().read_raw(raw.to_vec()).ok()?;

    let retained: Vec<&exif::Field> = parsed
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .filter(|f| !(strip_date && DATE_TAGS.contains(&f.tag)))
        .filter(|f| !(strip_camera && CAMERA_TAGS.contains(&f.tag)))
        .collect();

    let mut writer = exif::experimental::Writer::new();
    for field in &retained {
        writer.push_field(field);
    }
    let mut out = std::io::Cursor::new(Vec::new());
    writer.write(&mut out, false).ok()?;
    debug!("Rebuilt EXIF block with {} field(s)", retained.len());
    Some(out.into_inner())
}

/// Reads the EXIF orientation code (1-8) from a raw EXIF block.
pub fn orientation(raw: &[u8]) -> Option<u32> {
    let parsed = Reader::new().read_raw(raw.to_vec()).ok()?;
    parsed
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
}

/// Applies an EXIF orientation code to a decoded surface.
///
/// Unknown or missing codes leave the surface untouched; a corrupt
/// orientation tag is never fatal for the item.
pub fn apply_orientation(image: DynamicImage, code: Option<u32>) -> DynamicImage {
    match code {
        Some(2) => image.fliph(),
        Some(3) => image.rotate180(),
        Some(4) => image.flipv(),
        Some(5) => image.rotate90().fliph(),
        Some(6) => image.rotate90(),
        Some(7) => image.rotate270().fliph(),
        Some(8) => image.rotate270(),
        _ => image,
    }
}

/// Embeds an EXIF block into an encoded JPEG. Returns the input unchanged
/// when there is nothing to embed or the output cannot be parsed.
pub fn embed_jpeg(encoded: Vec<u8>, exif: Option<&Bytes>) -> Vec<u8> {
    let Some(exif) = exif else {
        return encoded;
    };
    match Jpeg::from_bytes(Bytes::from(encoded.clone())) {
        Ok(mut jpeg) => {
            jpeg.set_exif(Some(exif.clone()));
            jpeg.encoder().bytes().to_vec()
        }
        Err(e) => {
            warn!("Could not re-open encoded JPEG for EXIF embedding: {e}");
            encoded
        }
    }
}

/// Embeds an EXIF block into an encoded WebP.
pub fn embed_webp(encoded: Vec<u8>, exif: Option<&Bytes>) -> Vec<u8> {
    let Some(exif) = exif else {
        return encoded;
    };
    match WebP::from_bytes(Bytes::from(encoded.clone())) {
        Ok(mut webp) => {
            webp.set_exif(Some(exif.clone()));
            webp.encoder().bytes().to_vec()
        }
        Err(e) => {
            warn!("Could not re-open encoded WebP for EXIF embedding: {e}");
            encoded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal little-endian TIFF block with Orientation=6, Make="X" and
    /// DateTime present, hand-assembled for policy tests.
    fn sample_exif() -> Vec<u8> {
        use exif::experimental::Writer;
        use exif::{Field, Value};

        let orientation = Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![6]),
        };
        let make = Field {
            tag: Tag::Make,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"TestCam".to_vec()]),
        };
        let datetime = Field {
            tag: Tag::DateTime,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"2026:01:01 12:00:00".to_vec()]),
        };
        let mut writer = Writer::new();
        writer.push_field(&orientation);
        writer.push_field(&make);
        writer.push_field(&datetime);
        let mut out = std::io::Cursor::new(Vec::new());
        writer.write(&mut out, true).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_orientation_read() {
        let raw = sample_exif();
        assert_eq!(orientation(&raw), Some(6));
    }

    #[test]
    fn test_preserve_keeps_block() {
        let raw = Bytes::from(sample_exif());
        let out = apply_policy(Some(raw.clone()), MetadataPolicy::Preserve);
        assert_eq!(out, Some(raw));
    }

    #[test]
    fn test_strip_all_drops_block() {
        let raw = Bytes::from(sample_exif());
        assert_eq!(apply_policy(Some(raw), MetadataPolicy::StripAll), None);
    }

    #[test]
    fn test_strip_camera_removes_make_keeps_date() {
        let raw = Bytes::from(sample_exif());
        let out = apply_policy(Some(raw), MetadataPolicy::StripCamera).unwrap();
        let parsed = Reader::new().read_raw(out.to_vec()).unwrap();
        assert!(parsed.get_field(Tag::Make, In::PRIMARY).is_none());
        assert!(parsed.get_field(Tag::DateTime, In::PRIMARY).is_some());
    }

    #[test]
    fn test_strip_date_removes_datetime() {
        let raw = Bytes::from(sample_exif());
        let out = apply_policy(Some(raw), MetadataPolicy::StripDate).unwrap();
        let parsed = Reader::new().read_raw(out.to_vec()).unwrap();
        assert!(parsed.get_field(Tag::DateTime, In::PRIMARY).is_none());
        assert!(parsed.get_field(Tag::Make, In::PRIMARY).is_some());
    }

    #[test]
    fn test_garbage_block_falls_back_to_strip_all() {
        let raw = Bytes::from_static(b"not exif at all");
        assert_eq!(apply_policy(Some(raw), MetadataPolicy::StripDate), None);
    }

    #[test]
    fn test_orientation_codes() {
        let img = DynamicImage::new_rgb8(4, 2);
        let rotated = apply_orientation(img.clone(), Some(6));
        assert_eq!((rotated.width(), rotated.height()), (2, 4));
        let untouched = apply_orientation(img, None);
        assert_eq!((untouched.width(), untouched.height()), (4, 2));
    }
}
