//! Interactive crop editor bindings.
//!
//! `JsCropEditor` pairs a viewport mapper with a crop region so the capture
//! screen can drive the rectangle with raw pointer coordinates and read back
//! the crop in source pixels.
//!
//! ```typescript
//! const editor = new JsCropEditor({ min_size: 50 });
//! editor.layout(canvas.clientWidth, canvas.clientHeight, raster.width, raster.height);
//! editor.initialize(undefined);
//!
//! canvas.onpointerdown = (e) => {
//!   const handle = editor.hit_test(e.offsetX, e.offsetY, 12);
//!   if (handle) editor.begin_drag(e.offsetX, e.offsetY, handle === 'move' ? undefined : handle);
//! };
//! canvas.onpointermove = (e) => draw(editor.update_drag(e.offsetX, e.offsetY));
//! canvas.onpointerup = () => editor.end_drag();
//!
//! const rect = editor.source_rect();
//! const cropped = crop_raster(raster, rect.left, rect.top, rect.width, rect.height);
//! ```

use scanroom_core::geometry::Point;
use scanroom_core::{
    CornerHandle, CropRegion, CropState, DisplayFrame, DragMode, EditorConfig, ViewportMapper,
};
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::JsRect;

/// Crop rectangle state machine for one document.
#[wasm_bindgen]
pub struct JsCropEditor {
    mapper: ViewportMapper,
    region: CropRegion,
}

#[wasm_bindgen]
impl JsCropEditor {
    /// Create an editor from a (possibly partial) config object.
    ///
    /// `undefined` or `null` uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCropEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        Ok(Self::with_config(&config))
    }

    /// Record the measured display size and the raster size.
    ///
    /// When only the display size changed, an existing rectangle is scaled to
    /// it. A new raster size (rotate, crop) drops the rectangle; call
    /// `initialize` again.
    pub fn layout(
        &mut self,
        display_width: f64,
        display_height: f64,
        source_width: u32,
        source_height: u32,
    ) -> Result<Option<JsRect>, JsValue> {
        let previous = self.mapper.frame();
        if (previous.source_width, previous.source_height) != (source_width, source_height) {
            self.region.invalidate();
        }
        self.mapper = ViewportMapper::new(DisplayFrame::new(
            display_width,
            display_height,
            source_width,
            source_height,
        ));
        self.region
            .relayout(self.mapper.display_size())
            .map(|rect| rect.map(JsRect::from))
            .map_err(to_js_error)
    }

    /// Seed the rectangle in display units, or use the default inset.
    pub fn initialize(&mut self, seed: Option<JsRect>) -> Result<JsRect, JsValue> {
        self.region
            .initialize(self.mapper.display_size(), seed.map(Into::into))
            .map(JsRect::from)
            .map_err(to_js_error)
    }

    /// Seed the rectangle from a detector result in source pixels.
    pub fn initialize_from_source(&mut self, seed: &JsRect) -> Result<JsRect, JsValue> {
        let display = self.mapper.rect_to_display((*seed).into()).map_err(to_js_error)?;
        self.initialize(Some(display.into()))
    }

    /// Start a drag. `handle` is `topLeft`, `topRight`, `bottomLeft`,
    /// `bottomRight`, or absent to move the whole rectangle.
    pub fn begin_drag(&mut self, x: f64, y: f64, handle: Option<String>) -> Result<(), JsValue> {
        let handle = match handle.as_deref() {
            None => None,
            Some(name) => Some(
                parse_handle(name).ok_or_else(|| to_js_error(format!("Unknown handle: {name}")))?,
            ),
        };
        self.region
            .begin_drag(Point::new(x, y), handle)
            .map_err(to_js_error)
    }

    pub fn update_drag(&mut self, x: f64, y: f64) -> Result<JsRect, JsValue> {
        self.region
            .update_drag(Point::new(x, y))
            .map(JsRect::from)
            .map_err(to_js_error)
    }

    pub fn end_drag(&mut self) -> Result<JsRect, JsValue> {
        self.region.end_drag().map(JsRect::from).map_err(to_js_error)
    }

    /// What a pointer-down at `(x, y)` would grab: a handle name, `move`, or
    /// nothing.
    pub fn hit_test(&self, x: f64, y: f64, tolerance: f64) -> Option<String> {
        self.region
            .hit_test(Point::new(x, y), tolerance)
            .map(|mode| match mode {
                DragMode::Move => "move",
                DragMode::ResizeCorner(handle) => handle_name(handle),
            })
            .map(str::to_string)
    }

    /// Drop the rectangle, e.g. after the raster was rotated.
    pub fn invalidate(&mut self) {
        self.region.invalidate();
    }

    /// `idle`, `initialized` or `dragging`.
    pub fn state(&self) -> String {
        match self.region.state() {
            CropState::Idle => "idle",
            CropState::Initialized => "initialized",
            CropState::Dragging(_) => "dragging",
        }
        .to_string()
    }

    /// The rectangle in display units.
    pub fn rect(&self) -> Option<JsRect> {
        self.region.rect().map(JsRect::from)
    }

    /// The rectangle in whole source pixels, clamped to the raster.
    pub fn source_rect(&self) -> Result<JsRect, JsValue> {
        let rect = self
            .region
            .rect()
            .ok_or_else(|| to_js_error("Crop region is not initialized"))?;
        self.mapper
            .rect_to_pixels(rect)
            .map(JsRect::from)
            .map_err(to_js_error)
    }
}

impl JsCropEditor {
    pub(crate) fn with_config(config: &EditorConfig) -> Self {
        Self {
            mapper: ViewportMapper::default(),
            region: CropRegion::new(config),
        }
    }
}

fn parse_handle(name: &str) -> Option<CornerHandle> {
    CornerHandle::ALL.into_iter().find(|&h| handle_name(h) == name)
}

fn handle_name(handle: CornerHandle) -> &'static str {
    match handle {
        CornerHandle::TopLeft => "topLeft",
        CornerHandle::TopRight => "topRight",
        CornerHandle::BottomLeft => "bottomLeft",
        CornerHandle::BottomRight => "bottomRight",
    }
}
