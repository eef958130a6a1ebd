//! Editor configuration.
//!
//! Hosts pass an [`EditorConfig`] when opening a document. Every field has a
//! default, so a partial object (for example from JavaScript) is accepted.

use serde::{Deserialize, Serialize};

use crate::decode::Encoding;

/// Smallest crop rectangle edge, in display units.
pub const DEFAULT_MIN_SIZE: f64 = 50.0;
/// Inset of the fallback rectangle, as a percentage of each frame side.
pub const DEFAULT_INSET_PERCENT: f64 = 5.0;
/// Budget for boundary detection before falling back to the inset rectangle.
pub const DEFAULT_DETECTION_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Upper bound for the inset so the fallback rectangle keeps a positive size.
const MAX_INSET_PERCENT: f64 = 45.0;

/// Tunables for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Minimum crop width and height in display units.
    pub min_size: f64,
    /// Fallback rectangle inset per side, percent of the display frame.
    pub inset_percent: f64,
    /// Boundary detection timeout in milliseconds.
    pub detection_timeout_ms: u64,
    /// Quality (1-100) used when finalize encodes JPEG.
    pub jpeg_quality: u8,
    /// Encoding produced by finalize.
    pub output_encoding: Encoding,
    /// Longest edge of filter previews; `None` renders at full resolution.
    pub preview_max_edge: Option<u32>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            inset_percent: DEFAULT_INSET_PERCENT,
            detection_timeout_ms: DEFAULT_DETECTION_TIMEOUT_MS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            output_encoding: Encoding::Jpeg,
            preview_max_edge: None,
        }
    }
}

impl EditorConfig {
    /// Copy with out-of-range values pulled back to something usable.
    pub fn validated(&self) -> Self {
        let min_size = if self.min_size.is_finite() && self.min_size > 0.0 {
            self.min_size
        } else {
            DEFAULT_MIN_SIZE
        };
        let inset_percent = if self.inset_percent.is_finite() {
            self.inset_percent.clamp(0.0, MAX_INSET_PERCENT)
        } else {
            DEFAULT_INSET_PERCENT
        };
        Self {
            min_size,
            inset_percent,
            detection_timeout_ms: self.detection_timeout_ms,
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
            output_encoding: self.output_encoding,
            preview_max_edge: self.preview_max_edge.filter(|&edge| edge > 0),
        }
    }

    pub fn detection_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.detection_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.min_size, 50.0);
        assert_eq!(config.inset_percent, 5.0);
        assert_eq!(config.detection_timeout_ms, 2000);
        assert_eq!(config.output_encoding, Encoding::Jpeg);
        assert_eq!(config.detection_timeout().as_millis(), 2000);
    }

    #[test]
    fn test_validated_repairs_values() {
        let config = EditorConfig {
            min_size: -3.0,
            inset_percent: 90.0,
            jpeg_quality: 0,
            preview_max_edge: Some(0),
            ..EditorConfig::default()
        }
        .validated();

        assert_eq!(config.min_size, DEFAULT_MIN_SIZE);
        assert_eq!(config.inset_percent, 45.0);
        assert_eq!(config.jpeg_quality, 1);
        assert_eq!(config.preview_max_edge, None);
    }

    #[test]
    fn test_validated_keeps_good_values() {
        let config = EditorConfig {
            min_size: 80.0,
            inset_percent: 10.0,
            preview_max_edge: Some(1024),
            ..EditorConfig::default()
        };
        assert_eq!(config.validated(), config);
    }

    #[test]
    fn test_validated_non_finite() {
        let config = EditorConfig {
            min_size: f64::NAN,
            inset_percent: f64::INFINITY,
            ..EditorConfig::default()
        }
        .validated();
        assert_eq!(config.min_size, DEFAULT_MIN_SIZE);
        assert_eq!(config.inset_percent, DEFAULT_INSET_PERCENT);
    }
}
