use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_conf_threshold() -> f64 {
    0.7
}

fn default_fps() -> u32 {
    1
}

/// Body of `POST /api/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_conf_threshold")]
    pub conf_threshold: f64,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl ProcessRequest {
    pub fn new(url: impl Into<String>, conf_threshold: f64, fps: u32) -> Self {
        Self {
            url: url.into(),
            conf_threshold,
            fps,
        }
    }
}

/// Optional details about the source video; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Aggregate counts as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryPayload {
    #[serde(default)]
    pub confidence_threshold: f64,
    #[serde(default)]
    pub total_frames: usize,
    #[serde(default)]
    pub total_detections: usize,
    #[serde(default)]
    pub by_class: BTreeMap<String, usize>,
}

/// Links to the artifacts of one processed video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultUrls {
    #[serde(default)]
    pub output_video_url: Option<String>,
    #[serde(default)]
    pub detection_json_url: Option<String>,
    #[serde(default)]
    pub metadata_url: Option<String>,
}

/// Successful reply to a processing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub status: String,
    pub video_id: String,
    #[serde(default)]
    pub metadata: VideoMetadata,
    #[serde(default)]
    pub summary: SummaryPayload,
    #[serde(default)]
    pub results: ResultUrls,
}

/// `409` reply: results for `video_id` already exist and should be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResponse {
    #[serde(default)]
    pub error: String,
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_request_fills_defaults() {
        let request: ProcessRequest =
            serde_json::from_str(r#"{"url":"https://youtu.be/abcdef123"}"#).unwrap();
        assert_eq!(request.conf_threshold, 0.7);
        assert_eq!(request.fps, 1);
    }

    #[test]
    fn process_response_tolerates_missing_sections() {
        let response: ProcessResponse =
            serde_json::from_str(r#"{"video_id":"abc","metadata":{"title":"clip"}}"#).unwrap();
        assert_eq!(response.metadata.title.as_deref(), Some("clip"));
        assert_eq!(response.metadata.duration, None);
        assert_eq!(response.summary.total_frames, 0);
        assert!(response.results.detection_json_url.is_none());
    }

    #[test]
    fn conflict_carries_video_id() {
        let conflict: ConflictResponse =
            serde_json::from_str(r#"{"error":"exists","video_id":"abc123"}"#).unwrap();
        assert_eq!(conflict.video_id, "abc123");
    }
}
