//! Filter rendering for preview and finalize.
//!
//! Applies the [`FilterSettings`] record to RGB pixel data.
//!
//! ## Order
//! 1. Brightness
//! 2. Contrast
//! 3. Saturation
//! 4. Denoise (3x3 median, after the tonal pass)

use tracing::{debug, instrument};

use crate::decode::{DecodeError, SourceRaster};
use crate::FilterSettings;

/// Render `settings` onto a copy of `raster`.
///
/// Out-of-range settings are clamped first, so callers may pass raw UI values.
/// The input raster is never modified.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn apply_filters(
    raster: &SourceRaster,
    settings: &FilterSettings,
) -> Result<SourceRaster, DecodeError> {
    let settings = settings.clamped();
    if settings.is_identity() {
        return Ok(raster.clone());
    }

    let mut pixels = raster.pixels().to_vec();
    if !settings.is_tonal_identity() {
        apply_tonal(&mut pixels, &settings);
    }
    let toned = SourceRaster::new(raster.width(), raster.height(), pixels, raster.encoding())?;

    if !settings.denoise {
        return Ok(toned);
    }

    debug!("Applying median denoise");
    let smoothed = imageproc::filter::median_filter(&toned.to_rgb_image()?, 1, 1);
    SourceRaster::from_rgb_image(smoothed, raster.encoding())
}

/// Apply brightness, contrast and saturation in place.
pub fn apply_tonal(pixels: &mut [u8], settings: &FilterSettings) {
    let brightness = settings.brightness / 100.0;
    let contrast = settings.contrast / 100.0;
    let saturation = settings.saturation / 100.0;

    for chunk in pixels.chunks_exact_mut(3) {
        let mut r = chunk[0] as f32 / 255.0;
        let mut g = chunk[1] as f32 / 255.0;
        let mut b = chunk[2] as f32 / 255.0;

        (r, g, b) = apply_brightness(r, g, b, brightness);
        (r, g, b) = apply_contrast(r, g, b, contrast);
        (r, g, b) = apply_saturation(r, g, b, saturation);

        chunk[0] = to_byte(r);
        chunk[1] = to_byte(g);
        chunk[2] = to_byte(b);
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Brightness as a multiplier: 1.0 leaves the pixel unchanged.
#[inline]
fn apply_brightness(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    (r * factor, g * factor, b * factor)
}

/// Contrast around mid-gray.
///
/// Formula: `output = (input - 0.5) * factor + 0.5`
#[inline]
fn apply_contrast(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    let midpoint = 0.5;
    (
        (r - midpoint) * factor + midpoint,
        (g - midpoint) * factor + midpoint,
        (b - midpoint) * factor + midpoint,
    )
}

/// Calculate luminance using ITU-R BT.709 coefficients.
#[inline]
fn calculate_luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Saturation by scaling each channel's distance from luminance.
#[inline]
fn apply_saturation(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    let gray = calculate_luminance(r, g, b);
    (
        gray + (r - gray) * factor,
        gray + (g - gray) * factor,
        gray + (b - gray) * factor,
    )
}
