//! Ambient light measurement.
//!
//! The light sampler downsizes a camera frame and reports its mean brightness.
//! Only the scalar leaves this module; the pixels are not retained.

use statrs::statistics::Statistics;

/// Brightness below which the scene counts as low light (0-255 scale).
pub const DEFAULT_LOW_LIGHT_CUTOFF: f64 = 50.0;

/// Mean per-pixel brightness of an RGBA buffer, where a pixel's brightness is
/// the average of its red, green and blue channels. Alpha is ignored.
///
/// Returns `None` when the buffer holds no complete pixel.
pub fn average_brightness(rgba: &[u8]) -> Option<f64> {
    let per_pixel: Vec<f64> = rgba
        .chunks_exact(4)
        .map(|px| (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0)
        .collect();

    if per_pixel.is_empty() {
        return None;
    }

    Some(per_pixel.iter().mean())
}

/// Whether a brightness reading counts as low light.
pub fn is_low_light(brightness: f64, cutoff: f64) -> bool {
    brightness < cutoff
}
