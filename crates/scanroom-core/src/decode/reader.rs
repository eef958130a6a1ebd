//! Captured image decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::{debug, instrument, warn};

use super::{DecodeError, Encoding, Orientation, SourceRaster};

/// Decode a captured JPEG or PNG buffer into an upright [`SourceRaster`].
///
/// The declared encoding must agree with the buffer's magic bytes. Camera
/// JPEGs usually carry an EXIF orientation tag; it is applied here so that the
/// raster matches what the user saw when capturing.
///
/// # Errors
///
/// - `DecodeError::InvalidFormat` if the bytes are not JPEG or PNG
/// - `DecodeError::EncodingMismatch` if they are, but not the declared one
/// - `DecodeError::CorruptedFile` if decoding fails part-way
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_raster(bytes: &[u8], declared: Encoding) -> Result<SourceRaster, DecodeError> {
    let detected = Encoding::sniff(bytes).ok_or(DecodeError::InvalidFormat)?;
    if detected != declared {
        warn!(?declared, ?detected, "Declared encoding does not match buffer");
        return Err(DecodeError::EncodingMismatch { declared, detected });
    }

    let orientation = match detected {
        Encoding::Jpeg => extract_orientation(bytes),
        Encoding::Png => Orientation::Normal,
    };

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(detected.image_format());
    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let rgb = apply_orientation(img, orientation).into_rgb8();
    debug!(
        width = rgb.width(),
        height = rgb.height(),
        ?orientation,
        "Raster decoded"
    );
    SourceRaster::from_rgb_image(rgb, detected)
}

/// Read the EXIF orientation tag, defaulting to `Normal` when absent.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}

fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
