//! JPEG and PNG encoding for finalized rasters.
//!
//! Both encoders are deterministic: the same pixels, encoding and quality
//! always produce the same bytes, which is what makes finalize idempotent.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::decode::{Encoding, SourceRaster};

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed
    #[error("{encoding:?} encoding failed: {message}")]
    EncodingFailed { encoding: Encoding, message: String },
}

/// Encode a raster to bytes in the requested encoding.
///
/// `quality` (1-100) only applies to JPEG and is clamped into range.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn encode_raster(
    raster: &SourceRaster,
    encoding: Encoding,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let bytes = encode_pixels(
        raster.pixels(),
        raster.width(),
        raster.height(),
        encoding,
        quality,
    )?;
    debug!(len = bytes.len(), ?encoding, "Raster encoded");
    Ok(bytes)
}

/// Encode raw RGB pixel data (3 bytes per pixel, row-major order).
pub fn encode_pixels(
    pixels: &[u8],
    width: u32,
    height: u32,
    encoding: Encoding,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    let result = match encoding {
        Encoding::Jpeg => JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
            .write_image(pixels, width, height, ExtendedColorType::Rgb8),
        Encoding::Png => {
            PngEncoder::new(&mut buffer).write_image(pixels, width, height, ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|e| EncodeError::EncodingFailed {
        encoding,
        message: e.to_string(),
    })?;

    Ok(buffer.into_inner())
}
