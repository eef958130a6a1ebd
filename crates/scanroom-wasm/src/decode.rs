//! Raster decoding bindings.
//!
//! # Example
//!
//! ```typescript
//! import { decode_raster, resize_to_fit } from '@scanroom/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const raster = decode_raster(bytes, file.type);
//! const preview = resize_to_fit(raster, 1280);
//! ```

use scanroom_core::decode;
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::{parse_encoding, JsRaster};

/// Decode a captured JPEG or PNG buffer.
///
/// `mime` must match the buffer's actual format. EXIF orientation is applied,
/// so the raster comes out upright.
#[wasm_bindgen]
pub fn decode_raster(bytes: &[u8], mime: &str) -> Result<JsRaster, JsValue> {
    let encoding = parse_encoding(mime)?;
    decode::decode_raster(bytes, encoding)
        .map(JsRaster::from_raster)
        .map_err(to_js_error)
}

/// MIME type sniffed from the buffer's magic bytes, if it is JPEG or PNG.
#[wasm_bindgen]
pub fn sniff_mime(bytes: &[u8]) -> Option<String> {
    decode::Encoding::sniff(bytes).map(|encoding| encoding.mime().to_string())
}

/// Downscale so the longest edge is at most `max_edge`. Never upscales.
#[wasm_bindgen]
pub fn resize_to_fit(raster: &JsRaster, max_edge: u32) -> Result<JsRaster, JsValue> {
    decode::resize_to_fit(raster.as_raster(), max_edge)
        .map(JsRaster::from_raster)
        .map_err(to_js_error)
}
