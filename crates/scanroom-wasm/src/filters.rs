//! Filter settings bindings.
//!
//! Filter values are percentages centered at 100 and clamped to `[50, 150]`
//! whenever they are set.

use scanroom_core::pipeline;
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::{parse_encoding, JsRaster};

/// Filter settings wrapper for JavaScript
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct FilterSettings {
    inner: scanroom_core::FilterSettings,
}

#[wasm_bindgen]
impl FilterSettings {
    /// Neutral settings (all percentages 100, no denoise)
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: scanroom_core::FilterSettings::default(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn brightness(&self) -> f32 {
        self.inner.brightness
    }

    #[wasm_bindgen(setter)]
    pub fn set_brightness(&mut self, value: f32) {
        self.inner.brightness = value;
        self.inner = self.inner.clamped();
    }

    #[wasm_bindgen(getter)]
    pub fn contrast(&self) -> f32 {
        self.inner.contrast
    }

    #[wasm_bindgen(setter)]
    pub fn set_contrast(&mut self, value: f32) {
        self.inner.contrast = value;
        self.inner = self.inner.clamped();
    }

    #[wasm_bindgen(getter)]
    pub fn saturation(&self) -> f32 {
        self.inner.saturation
    }

    #[wasm_bindgen(setter)]
    pub fn set_saturation(&mut self, value: f32) {
        self.inner.saturation = value;
        self.inner = self.inner.clamped();
    }

    #[wasm_bindgen(getter)]
    pub fn denoise(&self) -> bool {
        self.inner.denoise
    }

    #[wasm_bindgen(setter)]
    pub fn set_denoise(&mut self, value: bool) {
        self.inner.denoise = value;
    }

    /// Check if all values are neutral
    pub fn is_identity(&self) -> bool {
        self.inner.is_identity()
    }

    /// Serialize to a plain object for storage
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(to_js_error)
    }

    /// Deserialize from a plain object; missing fields are neutral
    pub fn from_json(value: JsValue) -> Result<FilterSettings, JsValue> {
        let inner: scanroom_core::FilterSettings =
            serde_wasm_bindgen::from_value(value).map_err(to_js_error)?;
        Ok(Self {
            inner: inner.clamped(),
        })
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterSettings {
    pub(crate) fn inner(&self) -> &scanroom_core::FilterSettings {
        &self.inner
    }
}

/// Render a filter preview. The input raster is not modified.
///
/// `max_edge` downsizes the preview first, which keeps slider feedback cheap.
///
/// ```typescript
/// const filters = new FilterSettings();
/// filters.brightness = 120;
/// const preview = preview_filters(raster, filters, 1280);
/// ```
#[wasm_bindgen]
pub fn preview_filters(
    raster: &JsRaster,
    filters: &FilterSettings,
    max_edge: Option<u32>,
) -> Result<JsRaster, JsValue> {
    pipeline::adjust_filters(raster.as_raster(), filters.inner(), max_edge)
        .map(JsRaster::from_raster)
        .map_err(to_js_error)
}

/// Bake `filters` into the full-resolution raster and encode it.
///
/// Identical inputs always produce identical bytes.
#[wasm_bindgen]
pub fn finalize_raster(
    raster: &JsRaster,
    filters: &FilterSettings,
    mime: &str,
    quality: u8,
) -> Result<Vec<u8>, JsValue> {
    let encoding = parse_encoding(mime)?;
    pipeline::finalize(raster.as_raster(), filters.inner(), encoding, quality)
        .map(|finalized| finalized.bytes)
        .map_err(to_js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, value: u8) -> JsRaster {
        JsRaster::new(width, height, vec![value; (width * height * 3) as usize], "jpeg").unwrap()
    }

    #[test]
    fn test_filter_settings_default() {
        let filters = FilterSettings::new();
        assert!(filters.is_identity());
        assert_eq!(filters.brightness(), 100.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut filters = FilterSettings::new();
        filters.set_brightness(400.0);
        filters.set_contrast(10.0);
        filters.set_saturation(125.0);
        assert_eq!(filters.brightness(), 150.0);
        assert_eq!(filters.contrast(), 50.0);
        assert_eq!(filters.saturation(), 125.0);

        filters.set_denoise(true);
        assert!(filters.denoise());
        assert!(!filters.is_identity());
    }

    #[test]
    fn test_preview_identity() {
        let raster = gray(4, 4, 77);
        let preview = preview_filters(&raster, &FilterSettings::new(), None).unwrap();
        assert_eq!(preview.pixels(), raster.pixels());
    }

    #[test]
    fn test_preview_brightness_and_downsize() {
        let mut filters = FilterSettings::new();
        filters.set_brightness(50.0);
        let preview = preview_filters(&gray(40, 20, 100), &filters, Some(10)).unwrap();
        assert_eq!((preview.width(), preview.height()), (10, 5));
        assert!(preview.pixels().iter().all(|&v| v == 50));
    }

    #[test]
    fn test_finalize_idempotent() {
        let mut filters = FilterSettings::new();
        filters.set_contrast(130.0);
        let raster = gray(16, 16, 90);
        let a = finalize_raster(&raster, &filters, "image/jpeg", 90).unwrap();
        let b = finalize_raster(&raster, &filters, "image/jpeg", 90).unwrap();
        assert_eq!(a, b);
    }
}
