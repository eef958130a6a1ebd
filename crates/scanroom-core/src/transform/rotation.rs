//! Quarter-turn rotation.
//!
//! For a `w x h` source, a quarter turn produces an `h x w` raster:
//!
//! ```text
//! Right (clockwise):         dst(h - 1 - y, x) = src(x, y)
//! Left  (counter-clockwise): dst(y, w - 1 - x) = src(x, y)
//! ```

use serde::{Deserialize, Serialize};

use crate::decode::SourceRaster;

/// Direction of a 90 degree turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateDirection {
    /// Counter-clockwise.
    Left,
    /// Clockwise.
    Right,
}

impl RotateDirection {
    pub fn inverse(self) -> RotateDirection {
        match self {
            RotateDirection::Left => RotateDirection::Right,
            RotateDirection::Right => RotateDirection::Left,
        }
    }
}

/// Rotate `raster` by 90 degrees, swapping its width and height.
///
/// The source's encoding tag is carried over.
pub fn rotate_quarter(raster: &SourceRaster, direction: RotateDirection) -> SourceRaster {
    let (src_w, src_h) = (raster.width() as usize, raster.height() as usize);
    let (dst_w, dst_h) = (src_h, src_w);
    let src = raster.pixels();
    let mut output = vec![0u8; dst_w * dst_h * 3];

    for y in 0..src_h {
        let src_row_start = y * src_w * 3;
        for x in 0..src_w {
            let (dst_x, dst_y) = match direction {
                RotateDirection::Right => (src_h - 1 - y, x),
                RotateDirection::Left => (y, src_w - 1 - x),
            };
            let src_idx = src_row_start + x * 3;
            let dst_idx = (dst_y * dst_w + dst_x) * 3;
            output[dst_idx..dst_idx + 3].copy_from_slice(&src[src_idx..src_idx + 3]);
        }
    }

    rebuild(dst_w as u32, dst_h as u32, output, raster)
}

/// Wrap a buffer whose length was derived from `width * height * 3`.
fn rebuild(width: u32, height: u32, pixels: Vec<u8>, source: &SourceRaster) -> SourceRaster {
    match SourceRaster::new(width, height, pixels, source.encoding()) {
        Ok(raster) => raster,
        // Unreachable: the buffer is sized from the dimensions above
        Err(_) => source.clone(),
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
