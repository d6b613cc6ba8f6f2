//! Downscale geometry for the compressed tier.

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Computes the target dimensions so the longer edge does not exceed
/// `max_dim`, preserving aspect ratio and rounding to the nearest whole
/// pixel. Returns `None` when the surface already fits (never upscales).
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    let longer = width.max(height);
    if longer <= max_dim || longer == 0 {
        return None;
    }
    let scale = f64::from(max_dim) / f64::from(longer);
    let new_w = ((f64::from(width) * scale).round() as u32).max(1);
    let new_h = ((f64::from(height) * scale).round() as u32).max(1);
    Some((new_w, new_h))
}

/// Downscales `image` for the compressed tier, or returns it unchanged
/// when no resize is needed. Lanczos3 for quality over speed.
pub fn downscale(image: DynamicImage, max_dim: u32) -> DynamicImage {
    match fit_within(image.width(), image.height(), max_dim) {
        Some((w, h)) => {
            debug!(
                "Downscaling {}x{} -> {}x{} (max dimension {})",
                image.width(),
                image.height(),
                w,
                h,
                max_dim
            );
            image.resize_exact(w, h, FilterType::Lanczos3)
        }
        None => image,
    }
}
