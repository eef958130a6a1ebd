//! Ordered, transactional raster edits.
//!
//! A [`RasterTransformPipeline`] owns the current [`SourceRaster`] of one
//! document and the log of [`TransformStep`]s applied to it.
//!
//! - Structural steps (rotate, crop) replace the current raster and are
//!   always appended.
//! - Filter steps only change the settings used for previews and finalize.
//!   A run of filter steps is kept as its latest entry, so slider ticks do
//!   not grow the log.
//!
//! Every step computes its result before touching any state, so a failing
//! step leaves the raster, the filters and the log exactly as they were.
//! Replaying the log against the original raster reproduces the current one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::EditorConfig;
use crate::decode::{resize_to_fit, Encoding, SourceRaster};
use crate::encode::encode_raster;
use crate::error::Result;
use crate::filters::apply_filters;
use crate::geometry::PixelRect;
use crate::transform::{crop_pixels, rotate_quarter};
use crate::FilterSettings;

pub use crate::transform::RotateDirection;

/// One entry in the edit log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransformStep {
    Rotate { direction: RotateDirection },
    /// Crop rectangle in source pixels of the raster it was applied to.
    Crop { rect: PixelRect },
    AdjustFilter { settings: FilterSettings },
}

impl TransformStep {
    /// True for steps that replace the current raster.
    pub fn is_structural(&self) -> bool {
        !matches!(self, TransformStep::AdjustFilter { .. })
    }
}

/// Finalize output, ready for upload and OCR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedRaster {
    /// Full-resolution raster with filters baked in.
    pub raster: SourceRaster,
    /// `raster` encoded as `encoding`.
    pub bytes: Vec<u8>,
    pub encoding: Encoding,
}

/// Rotate by a quarter turn. Width and height swap.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn rotate(raster: &SourceRaster, direction: RotateDirection) -> SourceRaster {
    rotate_quarter(raster, direction)
}

/// Crop to `rect`, clamped to the raster first.
#[instrument(skip(raster), fields(width = raster.width(), height = raster.height()))]
pub fn crop(raster: &SourceRaster, rect: PixelRect) -> SourceRaster {
    crop_pixels(raster, rect)
}

/// Render a filter preview, optionally downsized so its longest edge is at
/// most `max_edge`. The input raster is not modified.
#[instrument(skip(raster, settings), fields(width = raster.width(), height = raster.height()))]
pub fn adjust_filters(
    raster: &SourceRaster,
    settings: &FilterSettings,
    max_edge: Option<u32>,
) -> Result<SourceRaster> {
    let preview = match max_edge {
        Some(edge) => apply_filters(&resize_to_fit(raster, edge)?, settings)?,
        None => apply_filters(raster, settings)?,
    };
    Ok(preview)
}

/// Bake `settings` into a full-resolution copy of `raster` and encode it.
///
/// Deterministic: identical inputs give byte-identical output.
#[instrument(skip(raster, settings), fields(width = raster.width(), height = raster.height()))]
pub fn finalize(
    raster: &SourceRaster,
    settings: &FilterSettings,
    encoding: Encoding,
    quality: u8,
) -> Result<FinalizedRaster> {
    let baked = apply_filters(raster, settings)?.with_encoding(encoding);
    let bytes = encode_raster(&baked, encoding, quality)?;
    Ok(FinalizedRaster {
        raster: baked,
        bytes,
        encoding,
    })
}

/// The current raster of one document and how it got there.
#[derive(Debug, Clone)]
pub struct RasterTransformPipeline {
    original: Arc<SourceRaster>,
    current: Arc<SourceRaster>,
    steps: Vec<TransformStep>,
    filters: FilterSettings,
    preview_max_edge: Option<u32>,
    output_encoding: Encoding,
    jpeg_quality: u8,
}

impl RasterTransformPipeline {
    pub fn new(raster: SourceRaster) -> Self {
        Self::with_config(raster, &EditorConfig::default())
    }

    pub fn with_config(raster: SourceRaster, config: &EditorConfig) -> Self {
        let config = config.validated();
        let raster = Arc::new(raster);
        Self {
            original: Arc::clone(&raster),
            current: raster,
            steps: Vec::new(),
            filters: FilterSettings::default(),
            preview_max_edge: config.preview_max_edge,
            output_encoding: config.output_encoding,
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// The raster every step so far has been applied to.
    pub fn original(&self) -> &Arc<SourceRaster> {
        &self.original
    }

    pub fn current(&self) -> &Arc<SourceRaster> {
        &self.current
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn filters(&self) -> FilterSettings {
        self.filters
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.current.width(), self.current.height())
    }

    pub fn rotate(&mut self, direction: RotateDirection) -> Result<&Arc<SourceRaster>> {
        self.apply(TransformStep::Rotate { direction })?;
        Ok(&self.current)
    }

    pub fn crop(&mut self, rect: PixelRect) -> Result<&Arc<SourceRaster>> {
        self.apply(TransformStep::Crop { rect })?;
        Ok(&self.current)
    }

    /// Store new filter settings and return a preview rendered with them.
    pub fn adjust_filters(&mut self, settings: FilterSettings) -> Result<SourceRaster> {
        let settings = settings.clamped();
        let preview = adjust_filters(&self.current, &settings, self.preview_max_edge)?;
        self.commit(TransformStep::AdjustFilter { settings }, None);
        Ok(preview)
    }

    /// Preview of the current raster with the stored filters.
    pub fn preview(&self) -> Result<SourceRaster> {
        adjust_filters(&self.current, &self.filters, self.preview_max_edge)
    }

    /// Bake the stored filters and encode. Does not change the pipeline, so
    /// repeated calls give identical bytes.
    pub fn finalize(&self) -> Result<FinalizedRaster> {
        let finalized = finalize(
            &self.current,
            &self.filters,
            self.output_encoding,
            self.jpeg_quality,
        )?;
        info!(
            width = finalized.raster.width(),
            height = finalized.raster.height(),
            len = finalized.bytes.len(),
            "Raster finalized"
        );
        Ok(finalized)
    }

    /// Apply one step. On error nothing changes.
    #[instrument(skip(self), fields(steps = self.steps.len()))]
    pub fn apply(&mut self, step: TransformStep) -> Result<()> {
        match step {
            TransformStep::Rotate { direction } => {
                let next = rotate(&self.current, direction);
                self.commit(step, Some(next));
            }
            TransformStep::Crop { rect } => {
                let next = crop(&self.current, rect);
                self.commit(step, Some(next));
            }
            TransformStep::AdjustFilter { settings } => {
                self.commit(
                    TransformStep::AdjustFilter {
                        settings: settings.clamped(),
                    },
                    None,
                );
            }
        }
        Ok(())
    }

    /// Rebuild a pipeline by applying `steps` in order to `original`.
    pub fn replay(
        original: SourceRaster,
        steps: &[TransformStep],
        config: &EditorConfig,
    ) -> Result<Self> {
        let mut pipeline = Self::with_config(original, config);
        for step in steps {
            pipeline.apply(*step)?;
        }
        Ok(pipeline)
    }

    /// Record `step`, swapping in `next` when the step was structural.
    ///
    /// Consecutive filter adjustments collapse into the latest one; only the
    /// settings in force at the next structural step matter for replay.
    fn commit(&mut self, step: TransformStep, next: Option<SourceRaster>) {
        if let TransformStep::AdjustFilter { settings } = step {
            self.filters = settings;
        }
        if let Some(next) = next {
            debug!(
                width = next.width(),
                height = next.height(),
                ?step,
                "Raster replaced"
            );
            self.current = Arc::new(next);
        }
        match (step, self.steps.last_mut()) {
            (TransformStep::AdjustFilter { .. }, Some(last @ TransformStep::AdjustFilter { .. })) => {
                *last = step;
            }
            _ => self.steps.push(step),
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
