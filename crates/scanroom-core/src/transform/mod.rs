//! Structural raster edits: quarter-turn rotation and pixel cropping.
//!
//! Both operations are lossless. They copy pixels into a fresh buffer and
//! never resample, so rotating left then right restores the exact input.
//!
//! # Coordinate System
//!
//! - Origin is the top-left pixel
//! - Crops are whole source pixels ([`PixelRect`](crate::geometry::PixelRect))

mod crop;
mod rotation;

pub use crop::crop_pixels;
pub use rotation::{rotate_quarter, RotateDirection};
