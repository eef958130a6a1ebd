//! Scanroom Core - crop geometry and raster transforms for document capture
//!
//! This crate provides the editor core behind the capture screen: mapping
//! between the displayed image and the full-resolution raster, the draggable
//! crop rectangle, and the rotate/crop/filter/finalize raster pipeline.
//!
//! # Module Structure
//!
//! - `viewport` - display <-> source coordinate mapping
//! - `crop_region` - crop rectangle drag/resize state machine
//! - `detect` - boundary detector contract and inset fallback
//! - `pipeline` - ordered, transactional raster transform steps
//! - `session` - async per-document editor (feature `session`)

pub mod config;
pub mod crop_region;
pub mod decode;
pub mod detect;
pub mod encode;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod pipeline;
#[cfg(feature = "session")]
pub mod session;
pub mod transform;
pub mod viewport;

pub use config::EditorConfig;
pub use crop_region::{CornerHandle, CropRegion, CropState, DragMode, PointerEvent, PointerPhase};
pub use decode::{decode_raster, Encoding, SourceRaster};
pub use detect::default_inset_rect;
pub use error::{EditorError, Result};
pub use geometry::{PixelRect, Point, Rect, Size};
pub use pipeline::{FinalizedRaster, RasterTransformPipeline, RotateDirection, TransformStep};
pub use viewport::{DisplayFrame, ViewportMapper};

/// Lowest accepted filter percentage.
pub const FILTER_MIN: f32 = 50.0;
/// Highest accepted filter percentage.
pub const FILTER_MAX: f32 = 150.0;
/// Filter percentage that leaves pixels unchanged.
pub const FILTER_NEUTRAL: f32 = 100.0;

/// Filter parameters for preview and finalize
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Brightness percentage (50 to 150, 100 = unchanged)
    pub brightness: f32,
    /// Contrast percentage (50 to 150, 100 = unchanged)
    pub contrast: f32,
    /// Saturation percentage (50 to 150, 100 = unchanged)
    pub saturation: f32,
    /// Median smoothing pass
    pub denoise: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: FILTER_NEUTRAL,
            contrast: FILTER_NEUTRAL,
            saturation: FILTER_NEUTRAL,
            denoise: false,
        }
    }
}

impl FilterSettings {
    /// Create settings, clamping each percentage into range.
    pub fn new(brightness: f32, contrast: f32, saturation: f32, denoise: bool) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            denoise,
        }
        .clamped()
    }

    /// Copy with every percentage clamped to `[FILTER_MIN, FILTER_MAX]`.
    ///
    /// NaN falls back to neutral rather than propagating into pixel math.
    pub fn clamped(&self) -> Self {
        fn clamp_percent(v: f32) -> f32 {
            if v.is_nan() {
                FILTER_NEUTRAL
            } else {
                v.clamp(FILTER_MIN, FILTER_MAX)
            }
        }
        Self {
            brightness: clamp_percent(self.brightness),
            contrast: clamp_percent(self.contrast),
            saturation: clamp_percent(self.saturation),
            denoise: self.denoise,
        }
    }

    /// Brightness, contrast and saturation are all neutral.
    pub fn is_tonal_identity(&self) -> bool {
        self.brightness == FILTER_NEUTRAL
            && self.contrast == FILTER_NEUTRAL
            && self.saturation == FILTER_NEUTRAL
    }

    /// Check if all values are at their defaults
    pub fn is_identity(&self) -> bool {
        self.is_tonal_identity() && !self.denoise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_settings_default() {
        let settings = FilterSettings::default();
        assert!(settings.is_identity());
        assert_eq!(settings.brightness, 100.0);
    }

    #[test]
    fn test_filter_settings_not_identity() {
        let mut settings = FilterSettings::default();
        settings.denoise = true;
        assert!(!settings.is_identity());
        assert!(settings.is_tonal_identity());
    }

    #[test]
    fn test_filter_settings_new_clamps() {
        let settings = FilterSettings::new(10.0, 400.0, 120.0, false);
        assert_eq!(settings.brightness, 50.0);
        assert_eq!(settings.contrast, 150.0);
        assert_eq!(settings.saturation, 120.0);
    }

    #[test]
    fn test_filter_settings_clamps_non_finite() {
        let settings = FilterSettings::new(f32::NAN, f32::INFINITY, f32::NEG_INFINITY, false);
        assert_eq!(settings.brightness, 100.0);
        assert_eq!(settings.contrast, 150.0);
        assert_eq!(settings.saturation, 50.0);
    }
}
