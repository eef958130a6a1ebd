//! Per-document editing session.
//!
//! An [`EditorSession`] owns one document's viewport mapper, crop region,
//! boundary detection and raster pipeline. Nothing is shared between
//! sessions.
//!
//! Pointer handling (`begin_drag`, `update_drag`, `end_drag`) is synchronous
//! and never waits on raster work. Raster-producing operations go through a
//! FIFO queue drained by a single worker task, so at most one mutation is in
//! flight per document. Each submission returns a [`PendingMutation`].
//!
//! The worker applies a job to a copy of the pipeline on the blocking pool
//! and only adopts the copy when the job succeeds, so a failed step leaves
//! the previous raster in place.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::EditorConfig;
use crate::crop_region::{CornerHandle, CropRegion, CropState, PointerEvent, PointerPhase};
use crate::decode::{decode_raster, Encoding, SourceRaster};
use crate::detect::{BoundaryDetector, DetectionRequest, SeedOutcome};
use crate::error::{EditorError, Result};
use crate::geometry::{PixelRect, Point, Rect};
use crate::pipeline::{FinalizedRaster, RasterTransformPipeline, RotateDirection, TransformStep};
use crate::viewport::{DisplayFrame, ViewportMapper};
use crate::FilterSettings;

/// Called by the worker once the pipeline state is settled.
type Reply = Box<dyn FnOnce() + Send>;

/// A queued unit of raster work. Returns the pipeline to adopt, if any.
type Work = Box<dyn FnOnce(RasterTransformPipeline) -> (Option<RasterTransformPipeline>, Reply) + Send>;

struct Job {
    label: &'static str,
    work: Work,
}

/// Result of a queued raster operation.
#[derive(Debug)]
pub struct PendingMutation<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> PendingMutation<T> {
    /// Wait until the worker has applied (or rejected) the operation.
    pub async fn wait(self) -> Result<T> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(EditorError::SessionClosed),
        }
    }
}

/// One open document.
pub struct EditorSession {
    config: EditorConfig,
    mapper: ViewportMapper,
    region: CropRegion,
    detection: Option<DetectionRequest>,
    jobs: mpsc::UnboundedSender<Job>,
    raster: watch::Receiver<Arc<SourceRaster>>,
    worker: JoinHandle<()>,
}

impl EditorSession {
    /// Decode `bytes` off the async executor and open a session on the result.
    #[instrument(skip(bytes, config), fields(len = bytes.len()))]
    pub async fn open(bytes: Vec<u8>, encoding: Encoding, config: &EditorConfig) -> Result<Self> {
        let raster = tokio::task::spawn_blocking(move || decode_raster(&bytes, encoding))
            .await
            .map_err(|e| EditorError::RasterDecode(e.to_string()))??;
        Ok(Self::from_raster(raster, config))
    }

    /// Open a session on an already decoded raster. Must be called inside a
    /// tokio runtime.
    pub fn from_raster(raster: SourceRaster, config: &EditorConfig) -> Self {
        let config = config.validated();
        let mapper = ViewportMapper::new(DisplayFrame::new(
            0.0,
            0.0,
            raster.width(),
            raster.height(),
        ));
        let region = CropRegion::new(&config);
        let pipeline = RasterTransformPipeline::with_config(raster, &config);

        let (jobs, queue) = mpsc::unbounded_channel();
        let (current, watcher) = watch::channel(Arc::clone(pipeline.current()));
        let worker = tokio::spawn(run_worker(pipeline, queue, current));

        info!(
            width = mapper.frame().source_width,
            height = mapper.frame().source_height,
            "Editor session opened"
        );
        Self {
            config,
            mapper,
            region,
            detection: None,
            jobs,
            raster: watcher,
            worker,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Viewport frame, sized for the raster as it will be once every queued
    /// mutation has been applied.
    ///
    /// After a rotate or crop the display size is unmeasured until the host
    /// calls [`set_layout`](Self::set_layout) for the new raster.
    pub fn display_frame(&self) -> DisplayFrame {
        self.mapper.frame()
    }

    pub fn crop_state(&self) -> CropState {
        self.region.state()
    }

    pub fn crop_rect(&self) -> Option<Rect> {
        self.region.rect()
    }

    /// The crop rectangle in source pixels.
    pub fn source_rect(&self) -> Result<PixelRect> {
        let rect = self.region.rect().ok_or(EditorError::NotInitialized)?;
        self.mapper.rect_to_pixels(rect)
    }

    /// The most recently adopted raster.
    pub fn current_raster(&self) -> Arc<SourceRaster> {
        Arc::clone(&self.raster.borrow())
    }

    /// Watch the current raster, e.g. to redraw after each mutation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SourceRaster>> {
        self.raster.clone()
    }

    /// Record a new measured size for the display surface.
    ///
    /// An initialized crop rectangle is scaled to the new frame.
    pub fn set_layout(&mut self, width: f64, height: f64) -> Result<Option<Rect>> {
        self.mapper.relayout(width, height);
        self.region.relayout(self.mapper.display_size())
    }

    /// Seed the crop region with the default inset and start `detector` in
    /// the background.
    ///
    /// Waits for queued mutations first, so the detector sees the raster the
    /// frame describes. Call [`resolve_detection`](Self::resolve_detection)
    /// to adopt its result.
    pub async fn start_detection(&mut self, detector: Arc<dyn BoundaryDetector>) -> Result<Rect> {
        let rect = self.region.initialize(self.mapper.display_size(), None)?;
        let raster = self.submit("snapshot", |p| Ok(Arc::clone(p.current()))).wait().await?;

        self.cancel_detection();
        self.detection = Some(DetectionRequest::spawn(
            detector,
            raster,
            self.config.detection_timeout(),
        ));
        Ok(rect)
    }

    /// Wait for the running detection and seed the crop region with it.
    ///
    /// Timeouts and "nothing found" keep the default inset; a cancelled
    /// detection keeps whatever the user has done since. Never fails because
    /// of the detector.
    pub async fn resolve_detection(&mut self) -> Result<Rect> {
        let outcome = match self.detection.take() {
            Some(request) => request.outcome().await,
            None => SeedOutcome::NotFound,
        };

        let dragging = self.region.is_dragging();
        if let Some(px) = outcome.seed().filter(|_| !dragging) {
            let frame = self.mapper.frame();
            let px = px.clamp_to(frame.source_width, frame.source_height);
            let seed = self.mapper.pixels_to_display(px)?;
            return self.region.initialize(self.mapper.display_size(), Some(seed));
        }

        match self.region.rect() {
            Some(rect) => Ok(rect),
            None => self.region.initialize(self.mapper.display_size(), None),
        }
    }

    /// Cancel any running detection; its result will be discarded.
    pub fn cancel_detection(&mut self) {
        if let Some(request) = &self.detection {
            if !request.is_cancelled() {
                debug!("Cancelling boundary detection");
            }
            request.cancel();
        }
    }

    /// Start a drag. Manual input supersedes a running detection.
    pub fn begin_drag(&mut self, position: Point, handle: Option<CornerHandle>) -> Result<()> {
        self.region.begin_drag(position, handle)?;
        self.cancel_detection();
        Ok(())
    }

    pub fn update_drag(&mut self, position: Point) -> Result<Rect> {
        self.region.update_drag(position)
    }

    pub fn end_drag(&mut self) -> Result<Rect> {
        self.region.end_drag()
    }

    pub fn handle_event(&mut self, event: PointerEvent) -> Result<Rect> {
        if event.phase == PointerPhase::Down {
            self.begin_drag(event.position, event.handle)?;
            return self.region.rect().ok_or(EditorError::NotInitialized);
        }
        self.region.handle_event(event)
    }

    /// Queue a quarter turn.
    ///
    /// The crop region goes back to `Idle` and the frame takes the rotated
    /// dimensions right away. Geometry calls report `LayoutNotReady` until
    /// [`set_layout`](Self::set_layout) measures the rotated surface.
    pub fn rotate(&mut self, direction: RotateDirection) -> PendingMutation<(u32, u32)> {
        self.cancel_detection();
        self.region.invalidate();
        let frame = self.mapper.frame();
        self.replace_source(frame.source_height, frame.source_width);

        self.submit("rotate", move |p| {
            let raster = p.rotate(direction)?;
            Ok((raster.width(), raster.height()))
        })
    }

    /// Convert the crop rectangle to source pixels and queue the crop.
    ///
    /// The rectangle is consumed; the region is `Idle` afterwards and the
    /// layout must be measured again for the cropped raster.
    pub fn commit_crop(&mut self) -> Result<PendingMutation<(u32, u32)>> {
        let px = self.source_rect()?;
        self.region.take()?;
        self.cancel_detection();
        self.replace_source(px.width, px.height);
        debug!(?px, "Crop committed");

        Ok(self.submit("crop", move |p| {
            let raster = p.crop(px)?;
            Ok((raster.width(), raster.height()))
        }))
    }

    /// Store new filter settings; resolves to a preview rendered with them.
    pub fn set_filters(&mut self, settings: FilterSettings) -> PendingMutation<SourceRaster> {
        self.submit("filters", move |p| p.adjust_filters(settings))
    }

    pub fn preview(&self) -> PendingMutation<SourceRaster> {
        self.submit("preview", |p| p.preview())
    }

    /// The step log as of every mutation queued so far.
    pub fn steps(&self) -> PendingMutation<Vec<TransformStep>> {
        self.submit("steps", |p| Ok(p.steps().to_vec()))
    }

    /// Bake filters and encode, after everything queued before it.
    pub fn finalize(&self) -> PendingMutation<FinalizedRaster> {
        self.submit("finalize", |p| p.finalize())
    }

    /// Stop accepting work, let queued mutations finish, and shut down.
    pub async fn close(mut self) {
        self.cancel_detection();
        self.detection = None;
        let Self { jobs, worker, .. } = self;
        drop(jobs);
        if let Err(err) = worker.await {
            warn!(%err, "Editor worker ended abnormally");
        }
        info!("Editor session closed");
    }

    /// The raster is about to change shape: the old display measurement no
    /// longer describes it.
    fn replace_source(&mut self, width: u32, height: u32) {
        self.mapper.set_source(width, height);
        self.mapper.relayout(0.0, 0.0);
    }

    fn submit<T, F>(&self, label: &'static str, f: F) -> PendingMutation<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut RasterTransformPipeline) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let work: Work = Box::new(move |mut draft| {
            // A panicking step is a failed step; the session stays usable
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&mut draft)))
                .unwrap_or_else(|panic| {
                    let msg = panic_message(panic.as_ref());
                    warn!(label, %msg, "Mutation panicked, raster unchanged");
                    Err(EditorError::RasterDecode(msg))
                });
            let adopt = result.is_ok().then_some(draft);
            let reply: Reply = Box::new(move || {
                // The caller may have stopped waiting
                let _ = tx.send(result);
            });
            (adopt, reply)
        });

        // On a closed queue the job, and its reply sender, are dropped here,
        // which resolves the pending mutation with `SessionClosed`.
        if self.jobs.send(Job { label, work }).is_err() {
            warn!(label, "Editor session is closed");
        }
        PendingMutation { rx }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "raster operation panicked".to_string()
    }
}

/// Drain the queue one job at a time, in submission order.
async fn run_worker(
    mut pipeline: RasterTransformPipeline,
    mut queue: mpsc::UnboundedReceiver<Job>,
    current: watch::Sender<Arc<SourceRaster>>,
) {
    while let Some(Job { label, work }) = queue.recv().await {
        let draft = pipeline.clone();
        match tokio::task::spawn_blocking(move || work(draft)).await {
            Ok((adopt, reply)) => {
                match adopt {
                    Some(next) => {
                        if !Arc::ptr_eq(next.current(), pipeline.current()) {
                            current.send_replace(Arc::clone(next.current()));
                        }
                        pipeline = next;
                    }
                    None => debug!(label, "Mutation failed, raster unchanged"),
                }
                reply();
            }
            Err(err) => warn!(label, %err, "Mutation task failed, raster unchanged"),
        }
    }
    debug!(steps = pipeline.steps().len(), "Editor worker stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::crop_region::DragMode;
    use crate::detect::{Detection, NoopDetector};
    use crate::encode::encode_raster;
    use crate::geometry::Size;

    struct DelayedDetector {
        delay: Duration,
        answer: Detection,
    }

    #[async_trait]
    impl BoundaryDetector for DelayedDetector {
        fn name(&self) -> &str {
            "delayed"
        }

        async fn detect(&self, _raster: Arc<SourceRaster>) -> Detection {
            tokio::time::sleep(self.delay).await;
            self.answer
        }
    }

    fn delayed(ms: u64, answer: Detection) -> Arc<dyn BoundaryDetector> {
        Arc::new(DelayedDetector {
            delay: Duration::from_millis(ms),
            answer,
        })
    }

    fn raster(width: u32, height: u32) -> SourceRaster {
        let pixels = (0..width * height)
            .flat_map(|i| [(i % 251) as u8, (i % 13) as u8, 200])
            .collect();
        SourceRaster::new(width, height, pixels, Encoding::Jpeg).unwrap()
    }

    fn session(width: u32, height: u32) -> EditorSession {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("scanroom_core=debug")
            .with_test_writer()
            .try_init();
        EditorSession::from_raster(raster(width, height), &EditorConfig::default())
    }

    const INSET: Rect = Rect {
        left: 40.0,
        top: 30.0,
        width: 720.0,
        height: 540.0,
    };

    #[tokio::test(start_paused = true)]
    async fn test_default_inset_maps_to_source() {
        let mut session = session(1600, 1200);
        session.set_layout(800.0, 600.0).unwrap();

        let rect = session.start_detection(Arc::new(NoopDetector)).await.unwrap();
        assert_eq!(rect, INSET);
        assert_eq!(session.resolve_detection().await.unwrap(), INSET);
        assert_eq!(session.source_rect().unwrap(), PixelRect::new(80, 60, 1440, 1080));

        let dims = session.commit_crop().unwrap().wait().await.unwrap();
        assert_eq!(dims, (1440, 1080));
        assert_eq!(session.crop_state(), CropState::Idle);
        let current = session.current_raster();
        assert_eq!((current.width(), current.height()), (1440, 1080));

        // The cropped raster has to be measured again before re-seeding
        assert!(!session.display_frame().is_ready());
        let err = session.resolve_detection().await.unwrap_err();
        assert!(matches!(err, EditorError::LayoutNotReady { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_timeout_falls_back_to_inset() {
        let mut session = session(1600, 1200);
        session.set_layout(800.0, 600.0).unwrap();

        let found = Detection::Found(PixelRect::new(200, 100, 800, 600));
        session.start_detection(delayed(5000, found)).await.unwrap();
        assert_eq!(session.resolve_detection().await.unwrap(), INSET);
        assert_eq!(session.crop_state(), CropState::Initialized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_seed_is_mapped_to_display() {
        let mut session = session(1600, 1200);
        session.set_layout(800.0, 600.0).unwrap();

        let found = Detection::Found(PixelRect::new(200, 100, 800, 600));
        session.start_detection(delayed(100, found)).await.unwrap();
        let rect = session.resolve_detection().await.unwrap();
        assert_eq!(rect, Rect::new(100.0, 50.0, 400.0, 300.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_drag_cancels_detection() {
        let mut session = session(1600, 1200);
        session.set_layout(800.0, 600.0).unwrap();

        let found = Detection::Found(PixelRect::new(200, 100, 800, 600));
        session.start_detection(delayed(500, found)).await.unwrap();

        session
            .begin_drag(Point::new(760.0, 570.0), Some(CornerHandle::BottomRight))
            .unwrap();
        session.update_drag(Point::new(700.0, 500.0)).unwrap();
        let dragged = session.end_drag().unwrap();
        assert_eq!(dragged, Rect::new(40.0, 30.0, 660.0, 470.0));

        // The detector's answer arrives later and is discarded
        assert_eq!(session.resolve_detection().await.unwrap(), dragged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_drag_refused() {
        let mut session = session(1600, 1200);
        session.set_layout(800.0, 600.0).unwrap();
        session.start_detection(Arc::new(NoopDetector)).await.unwrap();

        session.begin_drag(Point::new(400.0, 300.0), None).unwrap();
        let err = session
            .begin_drag(Point::new(40.0, 30.0), Some(CornerHandle::TopLeft))
            .unwrap_err();
        assert_eq!(err, EditorError::DragAlreadyActive);
        assert_eq!(session.crop_state(), CropState::Dragging(DragMode::Move));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotate_invalidates_crop_region() {
        let mut session = session(1600, 1200);
        session.set_layout(800.0, 600.0).unwrap();
        session.start_detection(Arc::new(NoopDetector)).await.unwrap();
        session.begin_drag(Point::new(400.0, 300.0), None).unwrap();

        let pending = session.rotate(RotateDirection::Right);
        assert_eq!(session.crop_state(), CropState::Idle);
        assert_eq!(session.display_frame().source_width, 1200);
        assert_eq!(pending.wait().await.unwrap(), (1200, 1600));

        // The pre-rotation surface size no longer applies
        assert_eq!(session.display_frame().display, Size::new(0.0, 0.0));
        let err = session.resolve_detection().await.unwrap_err();
        assert!(matches!(err, EditorError::LayoutNotReady { .. }));
        let err = session.start_detection(Arc::new(NoopDetector)).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.crop_state(), CropState::Idle);

        // Re-seed against the rotated frame
        session.set_layout(600.0, 800.0).unwrap();
        let rect = session.start_detection(Arc::new(NoopDetector)).await.unwrap();
        assert_eq!(rect, Rect::new(30.0, 40.0, 540.0, 720.0));
        assert_eq!(session.source_rect().unwrap(), PixelRect::new(60, 80, 1080, 1440));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_apply_in_order() {
        let mut session = session(20, 10);
        let rotate = session.rotate(RotateDirection::Left);
        let filters = session.set_filters(FilterSettings::new(120.0, 100.0, 100.0, false));
        let finalized = session.finalize();

        assert_eq!(rotate.wait().await.unwrap(), (10, 20));
        let preview = filters.wait().await.unwrap();
        assert_eq!((preview.width(), preview.height()), (10, 20));
        let out = finalized.wait().await.unwrap();
        assert_eq!((out.raster.width(), out.raster.height()), (10, 20));

        let steps = session.steps().wait().await.unwrap();
        assert_eq!(steps.len(), 2);
        assert!(steps[0].is_structural());
    }

    #[tokio::test]
    async fn test_panicking_mutation_reports_error_and_session_survives() {
        let session = session(20, 10);
        let err = session
            .submit("explode", |_| -> Result<()> { panic!("bad step") })
            .wait()
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::RasterDecode(ref msg) if msg == "bad step"));

        let steps = session.steps().wait().await.unwrap();
        assert!(steps.is_empty());
        let out = session.finalize().wait().await.unwrap();
        assert_eq!((out.raster.width(), out.raster.height()), (20, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalize_is_idempotent() {
        let mut session = session(32, 24);
        session
            .set_filters(FilterSettings::new(110.0, 90.0, 130.0, true))
            .wait()
            .await
            .unwrap();
        let a = session.finalize().wait().await.unwrap();
        let b = session.finalize().wait().await.unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_events_route_through_session() {
        let mut session = session(1600, 1200);
        session.set_layout(800.0, 600.0).unwrap();
        session.start_detection(Arc::new(NoopDetector)).await.unwrap();

        session
            .handle_event(PointerEvent::down(Point::new(400.0, 300.0), None))
            .unwrap();
        session
            .handle_event(PointerEvent::moved(Point::new(420.0, 310.0)))
            .unwrap();
        let rect = session
            .handle_event(PointerEvent::up(Point::new(420.0, 310.0)))
            .unwrap();
        assert_eq!(rect, Rect::new(60.0, 40.0, 720.0, 540.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_layout_not_ready() {
        let mut session = session(1600, 1200);
        let err = session.start_detection(Arc::new(NoopDetector)).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(session.set_layout(0.0, 0.0).unwrap_err().is_retryable());
        assert_eq!(session.display_frame().display, Size::new(0.0, 0.0));
    }

    #[tokio::test]
    async fn test_open_decodes_bytes() {
        let bytes = encode_raster(&raster(12, 8), Encoding::Png, 90).unwrap();
        let session = EditorSession::open(bytes.clone(), Encoding::Png, &EditorConfig::default())
            .await
            .unwrap();
        let current = session.current_raster();
        assert_eq!((current.width(), current.height()), (12, 8));
        session.close().await;

        let err = EditorSession::open(bytes, Encoding::Jpeg, &EditorConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, EditorError::RasterDecode(_)));
    }

    #[tokio::test]
    async fn test_open_rejects_garbage() {
        let bytes = b"definitely not an image".to_vec();
        let result = EditorSession::open(bytes, Encoding::Jpeg, &EditorConfig::default()).await;
        assert!(matches!(result, Err(EditorError::RasterDecode(_))));
    }
}
