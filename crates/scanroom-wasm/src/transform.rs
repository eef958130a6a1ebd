//! Rotation and crop bindings.

use scanroom_core::geometry::PixelRect;
use scanroom_core::pipeline;
use scanroom_core::RotateDirection;
use wasm_bindgen::prelude::*;

use crate::types::JsRaster;

/// Rotate by 90 degrees; width and height swap.
///
/// ```typescript
/// const turned = rotate_raster(raster, true); // clockwise
/// ```
#[wasm_bindgen]
pub fn rotate_raster(raster: &JsRaster, clockwise: bool) -> JsRaster {
    let direction = if clockwise {
        RotateDirection::Right
    } else {
        RotateDirection::Left
    };
    JsRaster::from_raster(pipeline::rotate(raster.as_raster(), direction))
}

/// Crop to a rectangle in source pixels, clamped to the raster.
#[wasm_bindgen]
pub fn crop_raster(raster: &JsRaster, left: u32, top: u32, width: u32, height: u32) -> JsRaster {
    let rect = PixelRect::new(left, top, width, height);
    JsRaster::from_raster(pipeline::crop(raster.as_raster(), rect))
}
