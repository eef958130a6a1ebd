//! Downscaling for display-sized previews.
//!
//! Previews only need as many pixels as the display surface shows, so filter
//! previews can be rendered on a reduced copy. All functions return new
//! rasters without modifying the input.

use image::imageops::FilterType;

use super::{DecodeError, SourceRaster};

/// Resize a raster to fit within `max_edge` while preserving aspect ratio.
///
/// Rasters that already fit are returned unchanged (never upscaled).
///
/// # Errors
///
/// Returns `DecodeError::EmptyRaster` if `max_edge` is zero.
pub fn resize_to_fit(raster: &SourceRaster, max_edge: u32) -> Result<SourceRaster, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::EmptyRaster {
            width: 0,
            height: 0,
        });
    }

    let (src_width, src_height) = (raster.width(), raster.height());
    if src_width <= max_edge && src_height <= max_edge {
        return Ok(raster.clone());
    }

    let (new_width, new_height) = calculate_fit_dimensions(src_width, src_height, max_edge);
    let rgb = raster.to_rgb_image()?;
    // Triangle (bilinear) is plenty for an on-screen preview.
    let resized = image::imageops::resize(&rgb, new_width, new_height, FilterType::Triangle);
    SourceRaster::from_rgb_image(resized, raster.encoding())
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}
