//! Boundary detection contract and the inset fallback.
//!
//! Detection itself is an injected capability: anything implementing
//! [`BoundaryDetector`] can propose a seed rectangle in source pixels.
//! [`DetectionRequest`] runs a detector off the interactive path with a
//! timeout and a cancellation token. Whatever happens (no result, timeout,
//! cancellation) the crop region can always be seeded with
//! [`default_inset_rect`].

use crate::geometry::{Rect, Size};

/// The rectangle inset by `inset_percent` of each side of `frame`.
///
/// 5% of an 800x600 frame is `{40, 30, 720, 540}`. The inset is limited to
/// 45% so the result always has a positive size.
pub fn default_inset_rect(frame: Size, inset_percent: f64) -> Rect {
    let fraction = if inset_percent.is_finite() {
        inset_percent.clamp(0.0, 45.0) / 100.0
    } else {
        0.0
    };
    let left = frame.width * fraction;
    let top = frame.height * fraction;
    Rect::new(left, top, frame.width - 2.0 * left, frame.height - 2.0 * top)
}

#[cfg(feature = "session")]
pub use detector::*;

#[cfg(feature = "session")]
mod detector {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;
    use tracing::{debug, warn};

    use crate::decode::SourceRaster;
    use crate::error::EditorError;
    use crate::geometry::PixelRect;

    /// What a detector found.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Detection {
        /// Candidate document bounds in source pixels.
        Found(PixelRect),
        NotFound,
    }

    /// Boundary detector trait
    #[async_trait]
    pub trait BoundaryDetector: Send + Sync {
        /// Short name for logs.
        fn name(&self) -> &str;

        /// Propose document bounds for `raster`.
        ///
        /// Implementations doing heavy work should move it off the async
        /// executor (for example with `spawn_blocking`).
        async fn detect(&self, raster: Arc<SourceRaster>) -> Detection;
    }

    /// Detector that never finds anything; the region always gets the inset.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NoopDetector;

    #[async_trait]
    impl BoundaryDetector for NoopDetector {
        fn name(&self) -> &str {
            "noop"
        }

        async fn detect(&self, _raster: Arc<SourceRaster>) -> Detection {
            Detection::NotFound
        }
    }

    /// How a detection request ended.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SeedOutcome {
        Detected(PixelRect),
        NotFound,
        TimedOut,
        /// Superseded by manual input; any late result was discarded.
        Cancelled,
    }

    impl SeedOutcome {
        /// The detected rectangle, if one should be used as the seed.
        pub fn seed(self) -> Option<PixelRect> {
            match self {
                SeedOutcome::Detected(rect) => Some(rect),
                _ => None,
            }
        }
    }

    /// An in-flight detection, bounded by a timeout and cancellable.
    #[derive(Debug)]
    pub struct DetectionRequest {
        token: CancellationToken,
        handle: JoinHandle<SeedOutcome>,
    }

    impl DetectionRequest {
        /// Start `detector` on a tokio task. Must be called inside a runtime.
        pub fn spawn(
            detector: Arc<dyn BoundaryDetector>,
            raster: Arc<SourceRaster>,
            timeout: Duration,
        ) -> Self {
            let token = CancellationToken::new();
            let cancel = token.clone();
            let timeout_ms = timeout.as_millis() as u64;

            let handle = tokio::spawn(async move {
                let name = detector.name().to_string();
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(detector = %name, "Detection cancelled");
                        SeedOutcome::Cancelled
                    }
                    result = tokio::time::timeout(timeout, detector.detect(raster)) => match result {
                        Ok(Detection::Found(rect)) => {
                            debug!(detector = %name, ?rect, "Boundary detected");
                            SeedOutcome::Detected(rect)
                        }
                        Ok(Detection::NotFound) => {
                            debug!(detector = %name, "No boundary detected");
                            SeedOutcome::NotFound
                        }
                        Err(_) => {
                            let err = EditorError::DetectionTimeout { timeout_ms };
                            warn!(detector = %name, %err, "Falling back to default inset");
                            SeedOutcome::TimedOut
                        }
                    },
                }
            });

            Self { token, handle }
        }

        /// Cancel the request. A result that arrives later is discarded.
        ///
        /// Dropping the request cancels it as well.
        pub fn cancel(&self) {
            self.token.cancel();
        }

        pub fn is_cancelled(&self) -> bool {
            self.token.is_cancelled()
        }

        pub fn is_finished(&self) -> bool {
            self.handle.is_finished()
        }

        /// Wait for the request to end.
        ///
        /// Cancellation wins over a result that raced it.
        pub async fn outcome(mut self) -> SeedOutcome {
            let outcome = match (&mut self.handle).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(%err, "Detection task failed");
                    SeedOutcome::NotFound
                }
            };
            if self.token.is_cancelled() && outcome != SeedOutcome::Cancelled {
                debug!(?outcome, "Discarding detection result after cancellation");
                return SeedOutcome::Cancelled;
            }
            outcome
        }
    }

    impl Drop for DetectionRequest {
        fn drop(&mut self) {
            self.token.cancel();
        }
    }
}


#[cfg(all(test, feature = "session"))]
mod detector_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::decode::{Encoding, SourceRaster};
    use crate::geometry::PixelRect;

    /// Answers with a fixed result after a fixed delay.
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

    fn raster() -> Arc<SourceRaster> {
        Arc::new(SourceRaster::new(4, 4, vec![0u8; 48], Encoding::Jpeg).unwrap())
    }

    fn delayed(ms: u64, answer: Detection) -> Arc<dyn BoundaryDetector> {
        Arc::new(DelayedDetector {
            delay: Duration::from_millis(ms),
            answer,
        })
    }

    const FOUND: Detection = Detection::Found(PixelRect {
        left: 1,
        top: 1,
        width: 2,
        height: 2,
    });

    #[tokio::test(start_paused = true)]
    async fn test_detection_found() {
        let request = DetectionRequest::spawn(delayed(100, FOUND), raster(), Duration::from_millis(2000));
        assert_eq!(
            request.outcome().await,
            SeedOutcome::Detected(PixelRect::new(1, 1, 2, 2))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_noop_detector() {
        let request = DetectionRequest::spawn(Arc::new(NoopDetector), raster(), Duration::from_millis(2000));
        let outcome = request.outcome().await;
        assert_eq!(outcome, SeedOutcome::NotFound);
        assert_eq!(outcome.seed(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detection_times_out() {
        let request = DetectionRequest::spawn(delayed(5000, FOUND), raster(), Duration::from_millis(2000));
        assert_eq!(request.outcome().await, SeedOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_result() {
        let request = DetectionRequest::spawn(delayed(100, FOUND), raster(), Duration::from_millis(2000));
        request.cancel();
        assert!(request.is_cancelled());
        assert_eq!(request.outcome().await, SeedOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_completion_still_discards() {
        let request = DetectionRequest::spawn(delayed(10, FOUND), raster(), Duration::from_millis(2000));
        tokio::time::sleep(Duration::from_millis(50)).await;
        request.cancel();
        assert_eq!(request.outcome().await, SeedOutcome::Cancelled);
    }
}
