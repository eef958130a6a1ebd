//! Editor-wide error taxonomy.
//!
//! Raster decoding and encoding keep their own detailed errors
//! ([`DecodeError`], [`EncodeError`]); anything that crosses a component
//! boundary is reported as an [`EditorError`].

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

/// Errors produced by the crop editor and the raster pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditorError {
    /// The display frame has not been measured yet. Retry after the next
    /// layout pass.
    #[error("Layout not ready: display frame is {width}x{height}")]
    LayoutNotReady { width: f64, height: f64 },

    /// Pointer input was malformed (for example a NaN coordinate). Ignored.
    #[error("Invalid drag input: {0}")]
    InvalidDragInput(String),

    /// A drag is already in progress; overlapping drags are refused.
    #[error("A drag is already active")]
    DragAlreadyActive,

    /// `update_drag` or `end_drag` without a preceding `begin_drag`.
    #[error("No drag is active")]
    NoActiveDrag,

    /// The crop region holds no rectangle.
    #[error("Crop region is not initialized")]
    NotInitialized,

    /// A raster could not be decoded, encoded or reconstructed. The step was
    /// aborted and the previous raster is untouched.
    #[error("Raster decode error: {0}")]
    RasterDecode(String),

    /// Boundary detection exceeded its budget. The crop region falls back to
    /// the default inset rectangle.
    #[error("Boundary detection timed out after {timeout_ms} ms")]
    DetectionTimeout { timeout_ms: u64 },

    /// A rectangle escaped its invariants. Only reachable through a bug.
    #[error("Crop rectangle invariant violated: {0}")]
    RectangleInvariantViolation(String),

    /// The editing session's worker has shut down.
    #[error("Editing session is closed")]
    SessionClosed,
}

impl From<DecodeError> for EditorError {
    fn from(err: DecodeError) -> Self {
        EditorError::RasterDecode(err.to_string())
    }
}

impl From<EncodeError> for EditorError {
    fn from(err: EncodeError) -> Self {
        EditorError::RasterDecode(err.to_string())
    }
}

impl EditorError {
    /// Retryable failures leave the editor ready for the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EditorError::LayoutNotReady { .. })
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
