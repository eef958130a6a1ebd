//! Plain geometry values shared by the viewport, crop region and pipeline.
//!
//! Display-space values are `f64` because pointer positions arrive as
//! fractional surface coordinates. Source-space crops that are handed to
//! the raster pipeline are integral [`PixelRect`]s.

use serde::{Deserialize, Serialize};

/// Tolerance used when checking rectangle invariants against float drift.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// `v` limited to `[lo, hi]`, preferring `hi` when the range is empty.
///
/// `f64::clamp` panics on `lo > hi`, which happens whenever the frame is
/// smaller than the minimum crop size.
#[inline]
pub(crate) fn bounded(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// A point in either display or source space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite (not NaN or infinite).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True once layout produced a usable (positive, finite) size.
    pub fn is_measured(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The rectangle covering the whole of `size`.
    pub fn full(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Check the crop invariants: inside `frame` and at least `min_size` on
    /// each axis. The minimum is capped by the frame itself, since a frame
    /// narrower than `min_size` can never hold a rectangle that wide.
    pub fn satisfies(&self, frame: Size, min_size: f64) -> bool {
        let min_w = min_size.min(frame.width);
        let min_h = min_size.min(frame.height);
        self.is_finite()
            && self.left >= -GEOMETRY_EPSILON
            && self.top >= -GEOMETRY_EPSILON
            && self.right() <= frame.width + GEOMETRY_EPSILON
            && self.bottom() <= frame.height + GEOMETRY_EPSILON
            && self.width >= min_w - GEOMETRY_EPSILON
            && self.height >= min_h - GEOMETRY_EPSILON
    }

    /// Force the rectangle into `frame`, keeping it as close as possible to
    /// the requested position and size.
    ///
    /// Size is settled first (between the capped minimum and the frame), then
    /// the origin is pulled back inside. Non-finite input yields the full frame.
    pub fn clamp_into(&self, frame: Size, min_size: f64) -> Rect {
        if !self.is_finite() {
            return Rect::full(frame);
        }
        let min_w = min_size.min(frame.width);
        let min_h = min_size.min(frame.height);
        let width = bounded(self.width, min_w, frame.width);
        let height = bounded(self.height, min_h, frame.height);
        let left = bounded(self.left, 0.0, frame.width - width);
        let top = bounded(self.top, 0.0, frame.height - height);
        Rect::new(left, top, width, height)
    }

    /// Multiply every component by the given per-axis factors.
    pub fn scaled(&self, sx: f64, sy: f64) -> Rect {
        Rect::new(
            self.left * sx,
            self.top * sy,
            self.width * sx,
            self.height * sy,
        )
    }
}

/// Integral rectangle in source-raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The rectangle covering an entire `width` x `height` raster.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Restrict to a `width` x `height` raster, never producing less than 1x1.
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelRect {
        let left = self.left.min(width.saturating_sub(1));
        let top = self.top.min(height.saturating_sub(1));
        let right = left.saturating_add(self.width).min(width);
        let bottom = top.saturating_add(self.height).min(height);
        PixelRect {
            left,
            top,
            width: right.saturating_sub(left).max(1),
            height: bottom.saturating_sub(top).max(1),
        }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.left as f64,
            self.top as f64,
            self.width as f64,
            self.height as f64,
        )
    }
}
