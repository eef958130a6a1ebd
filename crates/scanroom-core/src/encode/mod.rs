//! Raster encoding for handoff to upload and OCR.
//!
//! Finalized rasters are encoded to JPEG (configurable quality) or PNG.
//! Output bytes are deterministic for identical input.
//!
//! # Examples
//!
//! ```ignore
//! use scanroom_core::encode::encode_raster;
//! use scanroom_core::decode::Encoding;
//!
//! let bytes = encode_raster(&raster, Encoding::Jpeg, 90).unwrap();
//! println!("Encoded {} bytes", bytes.len());
//! ```

mod writer;

pub use writer::{encode_pixels, encode_raster, EncodeError};
