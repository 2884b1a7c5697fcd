use serde::{Deserialize, Serialize};
use std::future::Future;

/// Presentation constants shared by the modal controller and the preloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Spacing between sampled frames, used only for timestamp display.
    pub frame_interval_seconds: f64,
    /// Detail strings longer than this many characters render collapsed.
    pub detail_char_limit: usize,
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub preload_timeout_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            frame_interval_seconds: 1.0,
            detail_char_limit: 200,
            zoom_step: 0.25,
            min_zoom: 0.5,
            max_zoom: 5.0,
            preload_timeout_ms: 10_000,
        }
    }
}

impl ViewerConfig {
    /// Rejects settings the controller cannot honour as written.
    pub fn validate(&self) -> ViewerResult<()> {
        if !self.min_zoom.is_finite() || !self.max_zoom.is_finite() {
            return Err(ViewerError::InvalidConfig("zoom bounds must be finite".into()));
        }
        if self.min_zoom <= 0.0 {
            return Err(ViewerError::InvalidConfig("min_zoom must be positive".into()));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ViewerError::InvalidConfig(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 {
            return Err(ViewerError::InvalidConfig("zoom_step must be positive".into()));
        }
        if !self.frame_interval_seconds.is_finite() || self.frame_interval_seconds < 0.0 {
            return Err(ViewerError::InvalidConfig(
                "frame_interval_seconds must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Copy with usable values: non-finite or non-positive fields fall back to
    /// their defaults and swapped zoom bounds are reordered.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let first = positive(self.min_zoom, defaults.min_zoom);
        let second = positive(self.max_zoom, defaults.max_zoom);
        Self {
            frame_interval_seconds: if self.frame_interval_seconds.is_finite()
                && self.frame_interval_seconds >= 0.0
            {
                self.frame_interval_seconds
            } else {
                defaults.frame_interval_seconds
            },
            detail_char_limit: self.detail_char_limit,
            zoom_step: positive(self.zoom_step, defaults.zoom_step),
            min_zoom: first.min(second),
            max_zoom: first.max(second),
            preload_timeout_ms: self.preload_timeout_ms,
        }
    }
}

/// Common error type for manifest ingestion and frame loading.
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    #[error("manifest parse failure: {0}")]
    ManifestParse(#[from] serde_json::Error),
    #[error("manifest read failure: {0}")]
    ManifestIo(#[from] std::io::Error),
    #[error("frame transport failure: {0}")]
    Transport(String),
    #[error("frame decode failure: {0}")]
    Decode(String),
    #[error("frame load timed out after {0} ms")]
    Timeout(u64),
    #[error("invalid viewer config: {0}")]
    InvalidConfig(String),
}

pub type ViewerResult<T> = Result<T, ViewerError>;

/// Source of raw frame image bytes, typically the static artifact server.
///
/// Implementations only move bytes; validating that they form a complete
/// image is the preloader's job.
pub trait FrameFetcher {
    fn fetch(&self, frame_name: &str) -> impl Future<Output = ViewerResult<Vec<u8>>> + Send;
}
