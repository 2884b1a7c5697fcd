use crate::prelude::{FrameFetcher, ViewerConfig, ViewerError, ViewerResult};
use std::time::Duration;

/// Sequence number of a preload request. Later requests compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreloadTicket(u64);

impl PreloadTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues tickets and remembers which one is the latest.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn issue(&mut self) -> PreloadTicket {
        self.latest += 1;
        PreloadTicket(self.latest)
    }

    /// Makes every outstanding ticket stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, ticket: PreloadTicket) -> bool {
        ticket.0 == self.latest
    }
}

/// A frame the controller wants shown; hand it to [`FramePreloader::preload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadRequest {
    pub ticket: PreloadTicket,
    pub frame_name: String,
}

/// Fully decoded frame, safe to put on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub frame_name: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadOutcome {
    Ready(FrameImage),
    Failed(String),
}

/// Result of one preload, to be fed back through
/// [`ModalNavigationController::complete_preload`](crate::modal::ModalNavigationController::complete_preload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadCompletion {
    pub ticket: PreloadTicket,
    pub frame_name: String,
    pub outcome: PreloadOutcome,
}

/// Warms frame images off-screen.
///
/// A request resolves `Ready` only once the bytes have arrived and decoded as
/// a complete image; transport errors, undecodable bodies and timeouts all
/// resolve `Failed`. Requests are independent of each other; discarding stale
/// results is the controller's job.
pub struct FramePreloader<F> {
    fetcher: F,
    timeout: Duration,
}

impl<F: FrameFetcher> FramePreloader<F> {
    pub fn new(fetcher: F, config: &ViewerConfig) -> Self {
        Self {
            fetcher,
            timeout: Duration::from_millis(config.preload_timeout_ms),
        }
    }

    pub async fn preload(&self, request: PreloadRequest) -> PreloadCompletion {
        let outcome = match self.load(&request.frame_name).await {
            Ok(image) => PreloadOutcome::Ready(image),
            Err(err) => PreloadOutcome::Failed(err.to_string()),
        };
        PreloadCompletion {
            ticket: request.ticket,
            frame_name: request.frame_name,
            outcome,
        }
    }

    async fn load(&self, frame_name: &str) -> ViewerResult<FrameImage> {
        let bytes = tokio::time::timeout(self.timeout, self.fetcher.fetch(frame_name))
            .await
            .map_err(|_| ViewerError::Timeout(self.timeout.as_millis() as u64))??;
        decode_frame(frame_name, bytes)
    }
}

fn decode_frame(frame_name: &str, bytes: Vec<u8>) -> ViewerResult<FrameImage> {
    if bytes.is_empty() {
        return Err(ViewerError::Decode(format!("{} has an empty body", frame_name)));
    }
    let decoded = image::load_from_memory(&bytes)
        .map_err(|err| ViewerError::Decode(format!("{}: {}", frame_name, err)))?;
    Ok(FrameImage {
        frame_name: frame_name.to_string(),
        width: decoded.width(),
        height: decoded.height(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::collections::HashMap;
    use std::future::Future;
    use std::io::Cursor;

    struct MemoryFetcher {
        frames: HashMap<String, Vec<u8>>,
        delay: Duration,
    }

    impl FrameFetcher for MemoryFetcher {
        fn fetch(&self, frame_name: &str) -> impl Future<Output = ViewerResult<Vec<u8>>> + Send {
            let found = self.frames.get(frame_name).cloned();
            let name = frame_name.to_string();
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                found.ok_or_else(|| ViewerError::Transport(format!("404 for {}", name)))
            }
        }
    }

    fn png_bytes() -> Vec<u8> {
        let buffer = ImageBuffer::from_pixel(4, 3, Rgb([10u8, 20, 30]));
        let mut out = Cursor::new(Vec::new());
        buffer.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn preloader(delay: Duration, timeout_ms: u64) -> FramePreloader<MemoryFetcher> {
        let png = png_bytes();
        let truncated = png[..png.len() / 2].to_vec();
        let frames = HashMap::from([
            ("frame_1.jpg".to_string(), png),
            ("frame_2.jpg".to_string(), truncated),
            ("frame_3.jpg".to_string(), Vec::new()),
        ]);
        let config = ViewerConfig {
            preload_timeout_ms: timeout_ms,
            ..ViewerConfig::default()
        };
        FramePreloader::new(MemoryFetcher { frames, delay }, &config)
    }

    fn request(ticket: u64, frame_name: &str) -> PreloadRequest {
        PreloadRequest {
            ticket: PreloadTicket(ticket),
            frame_name: frame_name.to_string(),
        }
    }

    #[tokio::test]
    async fn complete_image_is_ready() {
        let completion = preloader(Duration::ZERO, 1_000)
            .preload(request(1, "frame_1.jpg"))
            .await;
        assert_eq!(completion.ticket, PreloadTicket(1));
        match completion.outcome {
            PreloadOutcome::Ready(image) => {
                assert_eq!((image.width, image.height), (4, 3));
                assert_eq!(image.frame_name, "frame_1.jpg");
            }
            PreloadOutcome::Failed(reason) => panic!("unexpected failure: {reason}"),
        }
    }

    #[tokio::test]
    async fn partial_empty_and_missing_images_fail() {
        let preloader = preloader(Duration::ZERO, 1_000);
        for frame in ["frame_2.jpg", "frame_3.jpg", "frame_9.jpg"] {
            let completion = preloader.preload(request(1, frame)).await;
            assert!(
                matches!(completion.outcome, PreloadOutcome::Failed(_)),
                "{frame} should fail"
            );
        }
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let completion = preloader(Duration::from_millis(500), 20)
            .preload(request(4, "frame_1.jpg"))
            .await;
        assert_eq!(
            completion.outcome,
            PreloadOutcome::Failed("frame load timed out after 20 ms".to_string())
        );
    }

    #[test]
    fn tracker_only_honours_latest_ticket() {
        let mut tracker = RequestTracker::default();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(first < second);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        tracker.invalidate();
        assert!(!tracker.is_current(second));
    }
}
