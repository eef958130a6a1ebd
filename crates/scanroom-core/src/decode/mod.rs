//! Raster decoding for the capture editor.
//!
//! This module provides functionality for:
//! - Decoding captured JPEG/PNG buffers into a [`SourceRaster`]
//! - Correcting EXIF orientation so rasters are upright
//! - Downscaling rasters for display-sized previews
//!
//! # Examples
//!
//! ```ignore
//! use scanroom_core::decode::{decode_raster, Encoding};
//!
//! let bytes = std::fs::read("receipt.jpg").unwrap();
//! let raster = decode_raster(&bytes, Encoding::Jpeg).unwrap();
//! println!("Decoded {}x{} raster", raster.width(), raster.height());
//! ```

mod reader;
mod resize;
mod types;

pub use reader::{decode_raster, get_orientation};
pub use resize::resize_to_fit;
pub use types::{DecodeError, Encoding, Orientation, SourceRaster};
