//! Display <-> source coordinate mapping.
//!
//! The image is rendered into a [`DisplayFrame`] whose size rarely matches the
//! raster's. [`ViewportMapper`] converts points and rectangles between the two
//! spaces using per-axis scale factors:
//!
//! ```text
//! sx = source_width  / display_width
//! sy = source_height / display_height
//! source = display * (sx, sy)
//! ```
//!
//! Until layout has measured the surface the mapper refuses to convert and
//! reports `LayoutNotReady`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EditorError, Result};
use crate::geometry::{PixelRect, Point, Rect, Size};

/// Where the raster is currently rendered, and how big the raster is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayFrame {
    /// Measured surface size in display units.
    pub display: Size,
    /// Raster size in pixels.
    pub source_width: u32,
    pub source_height: u32,
}

impl DisplayFrame {
    pub fn new(display_width: f64, display_height: f64, source_width: u32, source_height: u32) -> Self {
        Self {
            display: Size::new(display_width, display_height),
            source_width,
            source_height,
        }
    }

    /// Both the surface and the raster have a usable size.
    pub fn is_ready(&self) -> bool {
        self.display.is_measured() && self.source_width > 0 && self.source_height > 0
    }

    /// `(sx, sy)`, or `LayoutNotReady` while either size is zero.
    pub fn scale(&self) -> Result<(f64, f64)> {
        if !self.is_ready() {
            return Err(EditorError::LayoutNotReady {
                width: self.display.width,
                height: self.display.height,
            });
        }
        Ok((
            self.source_width as f64 / self.display.width,
            self.source_height as f64 / self.display.height,
        ))
    }
}

/// Converts between display space and source space for one document.
#[derive(Debug, Clone, Default)]
pub struct ViewportMapper {
    frame: DisplayFrame,
}

impl ViewportMapper {
    pub fn new(frame: DisplayFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> DisplayFrame {
        self.frame
    }

    pub fn display_size(&self) -> Size {
        self.frame.display
    }

    /// Recompute after the surface was measured or resized.
    pub fn relayout(&mut self, display_width: f64, display_height: f64) {
        self.frame.display = Size::new(display_width, display_height);
        debug!(display_width, display_height, "Viewport relayout");
    }

    /// Recompute after the raster changed size (rotate, crop).
    pub fn set_source(&mut self, source_width: u32, source_height: u32) {
        self.frame.source_width = source_width;
        self.frame.source_height = source_height;
        debug!(source_width, source_height, "Viewport source changed");
    }

    pub fn to_source(&self, p: Point) -> Result<Point> {
        let (sx, sy) = self.frame.scale()?;
        Ok(Point::new(p.x * sx, p.y * sy))
    }

    pub fn to_display(&self, p: Point) -> Result<Point> {
        let (sx, sy) = self.frame.scale()?;
        Ok(Point::new(p.x / sx, p.y / sy))
    }

    pub fn rect_to_source(&self, r: Rect) -> Result<Rect> {
        let (sx, sy) = self.frame.scale()?;
        Ok(r.scaled(sx, sy))
    }

    pub fn rect_to_display(&self, r: Rect) -> Result<Rect> {
        let (sx, sy) = self.frame.scale()?;
        Ok(r.scaled(1.0 / sx, 1.0 / sy))
    }

    /// Map a display rectangle to whole source pixels, clamped to the raster.
    ///
    /// Edges are rounded independently so that adjacent rectangles share an
    /// edge pixel-exactly.
    pub fn rect_to_pixels(&self, r: Rect) -> Result<PixelRect> {
        let src = self.rect_to_source(r)?;
        let left = src.left.round().max(0.0);
        let top = src.top.round().max(0.0);
        let right = src.right().round().max(left);
        let bottom = src.bottom().round().max(top);
        Ok(PixelRect::new(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        )
        .clamp_to(self.frame.source_width, self.frame.source_height))
    }

    /// Map a source-pixel rectangle (e.g. from a detector) into display space.
    pub fn pixels_to_display(&self, r: PixelRect) -> Result<Rect> {
        self.rect_to_display(r.as_rect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(dw: f64, dh: f64, sw: u32, sh: u32) -> ViewportMapper {
        ViewportMapper::new(DisplayFrame::new(dw, dh, sw, sh))
    }

    #[test]
    fn test_to_source_scales_up() {
        let m = mapper(800.0, 600.0, 1600, 1200);
        assert_eq!(m.to_source(Point::new(40.0, 30.0)).unwrap(), Point::new(80.0, 60.0));
    }

    #[test]
    fn test_to_display_scales_down() {
        let m = mapper(800.0, 600.0, 1600, 1200);
        assert_eq!(m.to_display(Point::new(80.0, 60.0)).unwrap(), Point::new(40.0, 30.0));
    }

    #[test]
    fn test_anisotropic_scale() {
        let m = mapper(400.0, 600.0, 1600, 1200);
        assert_eq!(m.frame().scale().unwrap(), (4.0, 2.0));
        assert_eq!(m.to_source(Point::new(10.0, 10.0)).unwrap(), Point::new(40.0, 20.0));
    }

    #[test]
    fn test_layout_not_ready() {
        let m = mapper(0.0, 600.0, 1600, 1200);
        assert!(matches!(
            m.to_source(Point::new(1.0, 1.0)),
            Err(EditorError::LayoutNotReady { .. })
        ));
        assert!(matches!(
            m.to_display(Point::new(1.0, 1.0)),
            Err(EditorError::LayoutNotReady { .. })
        ));

        let m = ViewportMapper::default();
        assert!(m.rect_to_pixels(Rect::new(0.0, 0.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_relayout_recomputes_scale() {
        let mut m = mapper(0.0, 0.0, 1600, 1200);
        assert!(m.frame().scale().is_err());
        m.relayout(800.0, 600.0);
        assert_eq!(m.frame().scale().unwrap(), (2.0, 2.0));
        m.relayout(1600.0, 1200.0);
        assert_eq!(m.frame().scale().unwrap(), (1.0, 1.0));
    }

    #[test]
    fn test_set_source_after_rotation() {
        let mut m = mapper(600.0, 800.0, 1600, 1200);
        m.set_source(1200, 1600);
        assert_eq!(m.frame().scale().unwrap(), (2.0, 2.0));
    }

    #[test]
    fn test_inset_scenario_maps_to_source() {
        let m = mapper(800.0, 600.0, 1600, 1200);
        let display = Rect::new(40.0, 30.0, 720.0, 540.0);
        assert_eq!(
            m.rect_to_source(display).unwrap(),
            Rect::new(80.0, 60.0, 1440.0, 1080.0)
        );
        assert_eq!(
            m.rect_to_pixels(display).unwrap(),
            PixelRect::new(80, 60, 1440, 1080)
        );
    }

    #[test]
    fn test_rect_to_pixels_clamps_to_raster() {
        let m = mapper(100.0, 100.0, 100, 100);
        let px = m.rect_to_pixels(Rect::new(90.0, 90.0, 50.0, 50.0)).unwrap();
        assert_eq!(px, PixelRect::new(90, 90, 10, 10));
    }

    #[test]
    fn test_pixels_to_display() {
        let m = mapper(800.0, 600.0, 1600, 1200);
        let r = m.pixels_to_display(PixelRect::new(200, 100, 400, 300)).unwrap();
        assert_eq!(r, Rect::new(100.0, 50.0, 200.0, 150.0));
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let m = mapper(333.0, 517.0, 4032, 3024);
        for &(x, y) in &[(0.0, 0.0), (12.5, 99.0), (4031.0, 3023.0), (1000.0, 7.0)] {
            let p = Point::new(x, y);
            let back = m.to_source(m.to_display(p).unwrap()).unwrap();
            assert!((back.x - p.x).abs() <= 1.0);
            assert!((back.y - p.y).abs() <= 1.0);
        }
    }
}
