//! Scanroom WASM - WebAssembly bindings for the scanroom capture editor
//!
//! Exposes the scanroom-core geometry and raster transforms to the browser
//! capture screen.
//!
//! # Module Structure
//!
//! - `editor` - Crop rectangle editor (viewport mapping + drag state machine)
//! - `types` - WASM-compatible wrapper types for rasters and rectangles
//! - `decode` - Raster decoding and preview downsizing
//! - `encode` - Raster encoding (JPEG, PNG)
//! - `transform` - Quarter-turn rotation and pixel crop
//! - `filters` - Tonal filters, preview and finalize
//!
//! # Usage
//!
//! ```typescript
//! import init, { decode_raster, rotate_raster, finalize_raster, FilterSettings } from '@scanroom/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const raster = rotate_raster(decode_raster(bytes, file.type), true);
//! const jpeg = finalize_raster(raster, new FilterSettings(), 'image/jpeg', 90);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod editor;
mod encode;
mod filters;
mod transform;
mod types;

// Re-export public types
pub use decode::{decode_raster, resize_to_fit, sniff_mime};
pub use editor::JsCropEditor;
pub use encode::encode_raster;
pub use filters::{finalize_raster, preview_filters, FilterSettings};
pub use transform::{crop_raster, rotate_raster};
pub use types::{JsRaster, JsRect};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Errors cross the boundary as JS `Error` objects carrying the message.
pub(crate) fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
