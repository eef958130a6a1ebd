//! Raster encoding bindings.
//!
//! ```typescript
//! const jpeg = encode_raster(raster, 'image/jpeg', 90);
//! ```

use scanroom_core::encode;
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::{parse_encoding, JsRaster};

/// Encode a raster as JPEG (with `quality`, 1-100) or PNG.
#[wasm_bindgen]
pub fn encode_raster(raster: &JsRaster, mime: &str, quality: u8) -> Result<Vec<u8>, JsValue> {
    let encoding = parse_encoding(mime)?;
    encode::encode_raster(raster.as_raster(), encoding, quality).map_err(to_js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg_magic() {
        let raster = JsRaster::new(8, 8, vec![90; 8 * 8 * 3], "jpeg").unwrap();
        let bytes = encode_raster(&raster, "image/jpeg", 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let raster = JsRaster::new(8, 8, (0..192).map(|v| v as u8).collect(), "png").unwrap();
        assert_eq!(
            encode_raster(&raster, "png", 90).unwrap(),
            encode_raster(&raster, "png", 90).unwrap()
        );
    }
}
