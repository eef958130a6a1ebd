//! Core types for raster decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for raster decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte buffer is not a recognized or supported image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The buffer decodes as a different format than the one declared.
    #[error("Declared encoding {declared:?} does not match detected {detected:?}")]
    EncodingMismatch { declared: Encoding, detected: Encoding },

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The pixel buffer length does not match the stated dimensions.
    #[error("Pixel buffer mismatch: expected {expected} bytes (width * height * 3), got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: {width}x{height}")]
    EmptyRaster { width: u32, height: u32 },
}

/// Encodings accepted from capture and produced by finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Jpeg,
    Png,
}

impl Encoding {
    /// Parse a MIME type or bare extension (`image/jpeg`, `jpg`, `png`, ...).
    pub fn from_mime(value: &str) -> Option<Encoding> {
        let value = value.trim().to_ascii_lowercase();
        let subtype = value.rsplit('/').next().unwrap_or(value.as_str());
        match subtype {
            "jpeg" | "jpg" | "pjpeg" => Some(Encoding::Jpeg),
            "png" => Some(Encoding::Png),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Encoding::Jpeg => "image/jpeg",
            Encoding::Png => "image/png",
        }
    }

    /// Sniff the encoding from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Encoding> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(Encoding::Jpeg),
            image::ImageFormat::Png => Some(Encoding::Png),
            _ => None,
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Encoding::Jpeg => image::ImageFormat::Jpeg,
            Encoding::Png => image::ImageFormat::Png,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Flip horizontal + rotate 270 CW.
    Transpose = 5,
    Rotate90CW = 6,
    /// Flip horizontal + rotate 90 CW.
    Transverse = 7,
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if correcting this orientation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// An immutable decoded raster with RGB pixel data.
///
/// Structural edits never touch an existing `SourceRaster`; they build a new
/// one. The buffer length is checked once at construction, so every other
/// operation can index it without re-validating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRaster {
    width: u32,
    height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pixels: Vec<u8>,
    /// Encoding the raster arrived in, or was last finalized as.
    encoding: Encoding,
}

impl SourceRaster {
    /// Create a raster, checking that `pixels` holds exactly `width * height * 3` bytes.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        encoding: Encoding,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyRaster { width, height });
        }
        let expected = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected {
            return Err(DecodeError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            encoding,
        })
    }

    /// Wrap an `image::RgbImage`. Its buffer length always matches its size.
    pub fn from_rgb_image(img: image::RgbImage, encoding: Encoding) -> Result<Self, DecodeError> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw(), encoding)
    }

    /// Copy into an `image::RgbImage` for processing with the `image` ecosystem.
    pub fn to_rgb_image(&self) -> Result<image::RgbImage, DecodeError> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or(
            DecodeError::BufferSizeMismatch {
                expected: (self.width as usize) * (self.height as usize) * 3,
                actual: self.pixels.len(),
            },
        )
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Same pixels, different declared encoding.
    pub fn with_encoding(&self, encoding: Encoding) -> Self {
        Self {
            encoding,
            ..self.clone()
        }
    }

    /// RGB triple at `(x, y)`. Caller guarantees the coordinate is in bounds.
    #[inline]
    pub(crate) fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}
