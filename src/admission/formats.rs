//! Extension and media-type allow-lists for admission screening.

/// Standard raster formats the transformer can decode (or pass through).
pub const STANDARD_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "jfif", "png", "gif", "webp", "avif", "bmp", "tiff", "tif",
    "heic", "heif",
];

/// Camera-RAW formats. Never decoded; only optionally copied through.
pub const RAW_EXTENSIONS: &[&str] = &[
    "raw", "arw", "srf", "sr2", "crw", "cr2", "cr3", "nef", "nrw", "orf", "rw2",
    "raf", "dng", "pef", "x3f", "3fr", "mef", "erf", "kdc", "dcr", "mos", "iiq",
    "rwl", "srw", "mrw", "gpr",
];

pub fn is_standard_extension(ext: &str) -> bool {
    STANDARD_EXTENSIONS.contains(&ext)
}

pub fn is_raw_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext)
}

pub fn is_allowed_extension(ext: &str) -> bool {
    is_standard_extension(ext) || is_raw_extension(ext)
}

/// Checks a declared media type against the allow-list for `ext`.
///
/// Only called for non-RAW extensions: RAW media types are wildly
/// inconsistent across camera vendors and are not screened.
pub fn media_type_matches(ext: &str, media_type: &str) -> bool {
    let media_type = media_type.to_ascii_lowercase();
    let allowed: &[&str] = match ext {
        "jpg" | "jpeg" | "jpe" | "jfif" => &["image/jpeg", "image/pjpeg"],
        "png" => &["image/png"],
        "gif" => &["image/gif"],
        "webp" => &["image/webp"],
        "avif" => &["image/avif"],
        "bmp" => &["image/bmp", "image/x-ms-bmp"],
        "tiff" | "tif" => &["image/tiff"],
        "heic" => &["image/heic", "image/heif"],
        "heif" => &["image/heif", "image/heic"],
        // Unknown extension: the extension check already rejected it
        _ => return false,
    };
    allowed.contains(&media_type.as_str())
}
