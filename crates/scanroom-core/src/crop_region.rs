//! Draggable, corner-resizable crop rectangle.
//!
//! # States
//!
//! ```text
//! Idle --initialize--> Initialized --begin_drag--> Dragging(mode)
//!   ^                      ^                            |
//!   |                      +---------end_drag-----------+
//!   +------invalidate / take (from any state)
//! ```
//!
//! The rectangle lives in display space and satisfies, after every call:
//! `left >= 0`, `top >= 0`, `right <= frame.width`, `bottom <= frame.height`,
//! `width >= min_size`, `height >= min_size` (the minimum is capped by the
//! frame when the frame itself is smaller).
//!
//! Drags are computed from the rectangle captured at `begin_drag` plus the
//! total pointer delta, so clamping on one update never accumulates error
//! into the next.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::detect::default_inset_rect;
use crate::error::{EditorError, Result};
use crate::geometry::{bounded, Point, Rect, Size};

/// One of the four resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CornerHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CornerHandle {
    pub const ALL: [CornerHandle; 4] = [
        CornerHandle::TopLeft,
        CornerHandle::TopRight,
        CornerHandle::BottomLeft,
        CornerHandle::BottomRight,
    ];

    /// The diagonally opposite corner, which stays pinned during a resize.
    pub fn opposite(self) -> CornerHandle {
        match self {
            CornerHandle::TopLeft => CornerHandle::BottomRight,
            CornerHandle::TopRight => CornerHandle::BottomLeft,
            CornerHandle::BottomLeft => CornerHandle::TopRight,
            CornerHandle::BottomRight => CornerHandle::TopLeft,
        }
    }

    #[inline]
    fn moves_left_edge(self) -> bool {
        matches!(self, CornerHandle::TopLeft | CornerHandle::BottomLeft)
    }

    #[inline]
    fn moves_top_edge(self) -> bool {
        matches!(self, CornerHandle::TopLeft | CornerHandle::TopRight)
    }

    /// Where this corner sits on `rect`.
    pub fn position(self, rect: &Rect) -> Point {
        let x = if self.moves_left_edge() {
            rect.left
        } else {
            rect.right()
        };
        let y = if self.moves_top_edge() {
            rect.top
        } else {
            rect.bottom()
        };
        Point::new(x, y)
    }
}

/// What a drag does to the rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeCorner(CornerHandle),
}

impl From<Option<CornerHandle>> for DragMode {
    fn from(handle: Option<CornerHandle>) -> Self {
        match handle {
            Some(h) => DragMode::ResizeCorner(h),
            None => DragMode::Move,
        }
    }
}

/// Observable state of a [`CropRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropState {
    Idle,
    Initialized,
    Dragging(DragMode),
}

/// Bookkeeping for the active drag, owned by the region.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    mode: DragMode,
    /// Pointer position at `begin_drag`.
    anchor: Point,
    /// Rectangle at `begin_drag`.
    start: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Host-agnostic pointer input. `handle` is only read on `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Point,
    #[serde(default)]
    pub handle: Option<CornerHandle>,
}

impl PointerEvent {
    pub fn down(position: Point, handle: Option<CornerHandle>) -> Self {
        Self {
            phase: PointerPhase::Down,
            position,
            handle,
        }
    }

    pub fn moved(position: Point) -> Self {
        Self {
            phase: PointerPhase::Move,
            position,
            handle: None,
        }
    }

    pub fn up(position: Point) -> Self {
        Self {
            phase: PointerPhase::Up,
            position,
            handle: None,
        }
    }
}

/// The crop rectangle and its drag state machine, one per document.
#[derive(Debug, Clone)]
pub struct CropRegion {
    frame: Size,
    rect: Option<Rect>,
    drag: Option<DragSession>,
    min_size: f64,
    inset_percent: f64,
    /// Malformed pointer inputs dropped so far.
    ignored_inputs: u32,
}

impl Default for CropRegion {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl CropRegion {
    pub fn new(config: &EditorConfig) -> Self {
        let config = config.validated();
        Self {
            frame: Size::default(),
            rect: None,
            drag: None,
            min_size: config.min_size,
            inset_percent: config.inset_percent,
            ignored_inputs: 0,
        }
    }

    pub fn state(&self) -> CropState {
        match (self.rect, self.drag) {
            (None, _) => CropState::Idle,
            (Some(_), None) => CropState::Initialized,
            (Some(_), Some(session)) => CropState::Dragging(session.mode),
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn frame(&self) -> Size {
        self.frame
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn ignored_inputs(&self) -> u32 {
        self.ignored_inputs
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Enter `Initialized` with `seed` clamped into `frame`, or with the
    /// default inset rectangle when there is no usable seed.
    ///
    /// Any active drag is dropped.
    pub fn initialize(&mut self, frame: Size, seed: Option<Rect>) -> Result<Rect> {
        if !frame.is_measured() {
            return Err(EditorError::LayoutNotReady {
                width: frame.width,
                height: frame.height,
            });
        }

        let rect = match seed {
            Some(seed) if seed.is_finite() => seed.clamp_into(frame, self.min_size),
            Some(seed) => {
                warn!(?seed, "Ignoring non-finite seed rectangle");
                self.default_rect(frame)
            }
            None => self.default_rect(frame),
        };

        self.frame = frame;
        self.drag = None;
        self.rect = Some(rect);
        debug!(?rect, "Crop region initialized");
        Ok(rect)
    }

    fn default_rect(&self, frame: Size) -> Rect {
        default_inset_rect(frame, self.inset_percent).clamp_into(frame, self.min_size)
    }

    /// Start moving (`handle == None`) or resizing from a corner.
    ///
    /// Refused without changing state when a drag is already active, when
    /// there is no rectangle, or when `position` is not finite.
    pub fn begin_drag(&mut self, position: Point, handle: Option<CornerHandle>) -> Result<()> {
        if !position.is_finite() {
            return Err(self.reject_input("begin_drag", position));
        }
        if let Some(active) = self.drag {
            debug!(active = ?active.mode, "Refusing overlapping drag");
            return Err(EditorError::DragAlreadyActive);
        }
        let start = self.rect.ok_or(EditorError::NotInitialized)?;

        let mode = DragMode::from(handle);
        self.drag = Some(DragSession {
            mode,
            anchor: position,
            start,
        });
        debug!(?mode, x = position.x, y = position.y, "Drag started");
        Ok(())
    }

    /// Apply the pointer's total displacement since `begin_drag`.
    ///
    /// Returns the updated rectangle, which already satisfies every invariant.
    pub fn update_drag(&mut self, position: Point) -> Result<Rect> {
        if !position.is_finite() {
            return Err(self.reject_input("update_drag", position));
        }
        let session = self.drag.ok_or(EditorError::NoActiveDrag)?;

        let dx = position.x - session.anchor.x;
        let dy = position.y - session.anchor.y;
        let next = match session.mode {
            DragMode::Move => self.translated(session.start, dx, dy),
            DragMode::ResizeCorner(handle) => self.resized(session.start, handle, dx, dy),
        };

        let next = self.enforce(next);
        self.rect = Some(next);
        Ok(next)
    }

    /// Finish the drag and return to `Initialized`.
    pub fn end_drag(&mut self) -> Result<Rect> {
        let session = self.drag.take().ok_or(EditorError::NoActiveDrag)?;
        let rect = self.rect.ok_or(EditorError::NotInitialized)?;
        debug!(mode = ?session.mode, ?rect, "Drag ended");
        Ok(rect)
    }

    /// Abort the drag, restoring the rectangle it started from.
    pub fn cancel_drag(&mut self) -> Result<Rect> {
        let session = self.drag.take().ok_or(EditorError::NoActiveDrag)?;
        self.rect = Some(session.start);
        debug!(mode = ?session.mode, "Drag cancelled");
        Ok(session.start)
    }

    /// Route a host pointer event to begin/update/end.
    pub fn handle_event(&mut self, event: PointerEvent) -> Result<Rect> {
        match event.phase {
            PointerPhase::Down => {
                self.begin_drag(event.position, event.handle)?;
                self.rect.ok_or(EditorError::NotInitialized)
            }
            PointerPhase::Move => self.update_drag(event.position),
            PointerPhase::Up => self.end_drag(),
        }
    }

    /// Which drag a pointer-down at `p` should start, if any.
    ///
    /// Corners win over the interior when within `tolerance` on both axes.
    pub fn hit_test(&self, p: Point, tolerance: f64) -> Option<DragMode> {
        let rect = self.rect?;
        if !p.is_finite() {
            return None;
        }
        let corner = CornerHandle::ALL.into_iter().find(|handle| {
            let c = handle.position(&rect);
            (c.x - p.x).abs() <= tolerance && (c.y - p.y).abs() <= tolerance
        });
        match corner {
            Some(handle) => Some(DragMode::ResizeCorner(handle)),
            None if rect.contains(p) => Some(DragMode::Move),
            None => None,
        }
    }

    /// Back to `Idle`. Used when the raster's geometry changes underneath.
    pub fn invalidate(&mut self) {
        if self.rect.is_some() {
            debug!(dragging = self.drag.is_some(), "Crop region invalidated");
        }
        self.rect = None;
        self.drag = None;
    }

    /// Consume the rectangle for a crop commit, leaving the region `Idle`.
    pub fn take(&mut self) -> Result<Rect> {
        let rect = self.rect.take().ok_or(EditorError::NotInitialized)?;
        self.drag = None;
        Ok(rect)
    }

    /// Follow a display resize, scaling the rectangle proportionally.
    ///
    /// An active drag is ended, because its anchor is in the old frame.
    pub fn relayout(&mut self, frame: Size) -> Result<Option<Rect>> {
        if !frame.is_measured() {
            return Err(EditorError::LayoutNotReady {
                width: frame.width,
                height: frame.height,
            });
        }
        let old = self.frame;
        self.frame = frame;
        self.drag = None;

        if let Some(rect) = self.rect {
            let scaled = if old.is_measured() {
                rect.scaled(frame.width / old.width, frame.height / old.height)
            } else {
                rect
            };
            self.rect = Some(scaled.clamp_into(frame, self.min_size));
        }
        Ok(self.rect)
    }

    fn translated(&self, start: Rect, dx: f64, dy: f64) -> Rect {
        let left = bounded(start.left + dx, 0.0, self.frame.width - start.width);
        let top = bounded(start.top + dy, 0.0, self.frame.height - start.height);
        Rect::new(left, top, start.width, start.height)
    }

    /// Move the two edges adjacent to `handle`; the other two never move.
    fn resized(&self, start: Rect, handle: CornerHandle, dx: f64, dy: f64) -> Rect {
        let min_w = self.min_size.min(self.frame.width);
        let min_h = self.min_size.min(self.frame.height);

        let (left, right) = if handle.moves_left_edge() {
            let right = start.right();
            (bounded(start.left + dx, 0.0, right - min_w), right)
        } else {
            let left = start.left;
            (left, bounded(start.right() + dx, left + min_w, self.frame.width))
        };

        let (top, bottom) = if handle.moves_top_edge() {
            let bottom = start.bottom();
            (bounded(start.top + dy, 0.0, bottom - min_h), bottom)
        } else {
            let top = start.top;
            (top, bounded(start.bottom() + dy, top + min_h, self.frame.height))
        };

        Rect::new(left, top, right - left, bottom - top)
    }

    /// Last line of defence for the invariants.
    ///
    /// Panics in debug builds; release builds clamp silently.
    fn enforce(&self, rect: Rect) -> Rect {
        if rect.satisfies(self.frame, self.min_size) {
            return rect;
        }
        let violation = EditorError::RectangleInvariantViolation(format!(
            "{rect:?} in frame {:?}",
            self.frame
        ));
        debug_assert!(false, "{violation}");
        warn!(%violation, "Clamping crop rectangle");
        rect.clamp_into(self.frame, self.min_size)
    }

    fn reject_input(&mut self, op: &str, position: Point) -> EditorError {
        self.ignored_inputs = self.ignored_inputs.saturating_add(1);
        warn!(op, x = position.x, y = position.y, "Ignoring non-finite pointer input");
        EditorError::InvalidDragInput(format!("{op}: ({}, {})", position.x, position.y))
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
