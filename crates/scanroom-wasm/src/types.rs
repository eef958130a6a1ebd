//! WASM-compatible wrapper types.
//!
//! These types wrap the core scanroom types and handle the conversion between
//! Rust and JavaScript data representations.

use scanroom_core::geometry::{PixelRect, Rect};
use scanroom_core::{Encoding, SourceRaster};
use wasm_bindgen::prelude::*;

use crate::to_js_error;

/// A decoded raster for JavaScript.
///
/// # Memory Management
///
/// The pixel data lives in WASM memory. `pixels()` copies it into a JavaScript
/// `Uint8Array`, so keep rasters on the WASM side and only extract pixels for
/// drawing.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsRaster {
    inner: SourceRaster,
}

#[wasm_bindgen]
impl JsRaster {
    /// Wrap RGB pixel data (3 bytes per pixel, row-major order).
    ///
    /// `mime` is the encoding the raster is tagged with, e.g. `image/jpeg`.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, mime: &str) -> Result<JsRaster, JsValue> {
        let encoding = parse_encoding(mime)?;
        SourceRaster::new(width, height, pixels, encoding)
            .map(JsRaster::from_raster)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// MIME type of the raster's encoding tag.
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.inner.encoding().mime().to_string()
    }

    /// Number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.pixels().len()
    }

    /// RGB pixel data as a `Uint8Array` copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels().to_vec()
    }

    /// Explicitly free WASM memory.
    ///
    /// Optional; wasm-bindgen's finalizer handles cleanup automatically.
    pub fn free(self) {}
}

impl JsRaster {
    pub(crate) fn from_raster(inner: SourceRaster) -> Self {
        Self { inner }
    }

    pub(crate) fn as_raster(&self) -> &SourceRaster {
        &self.inner
    }
}

/// Plain rectangle `{left, top, width, height}`.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[wasm_bindgen]
impl JsRect {
    #[wasm_bindgen(constructor)]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> JsRect {
        JsRect {
            left,
            top,
            width,
            height,
        }
    }
}

impl From<Rect> for JsRect {
    fn from(r: Rect) -> Self {
        JsRect::new(r.left, r.top, r.width, r.height)
    }
}

impl From<JsRect> for Rect {
    fn from(r: JsRect) -> Self {
        Rect::new(r.left, r.top, r.width, r.height)
    }
}

impl From<PixelRect> for JsRect {
    fn from(r: PixelRect) -> Self {
        r.as_rect().into()
    }
}

/// Parse a MIME type or extension into an encoding.
pub(crate) fn parse_encoding(mime: &str) -> Result<Encoding, JsValue> {
    Encoding::from_mime(mime).ok_or_else(|| to_js_error(format!("Unsupported encoding: {mime}")))
}
