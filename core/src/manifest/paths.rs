use super::api::ResultUrls;

pub const RESULTS_ROUTE: &str = "results";
pub const DETECTION_JSON: &str = "detection_results.json";
pub const METADATA_TXT: &str = "metadata.txt";
pub const OUTPUT_VIDEO: &str = "detections_video.mp4";
pub const PROCESSED_FRAMES: &str = "processed_frames";

/// Deterministic artifact URLs for one processed video, relative to the server root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPaths {
    video_id: String,
}

impl ResultPaths {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn base_url(&self) -> String {
        format!("/{}/{}", RESULTS_ROUTE, self.video_id)
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/{}", self.base_url(), DETECTION_JSON)
    }

    pub fn metadata_url(&self) -> String {
        format!("{}/{}", self.base_url(), METADATA_TXT)
    }

    pub fn output_video_url(&self) -> String {
        format!("{}/{}", self.base_url(), OUTPUT_VIDEO)
    }

    pub fn frame_url(&self, frame_name: &str) -> String {
        format!("{}/{}/{}", self.base_url(), PROCESSED_FRAMES, frame_name)
    }

    pub fn result_urls(&self) -> ResultUrls {
        ResultUrls {
            output_video_url: Some(self.output_video_url()),
            detection_json_url: Some(self.manifest_url()),
            metadata_url: Some(self.metadata_url()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_urls_are_siblings() {
        let paths = ResultPaths::new("abc123");
        assert_eq!(paths.manifest_url(), "/results/abc123/detection_results.json");
        assert_eq!(paths.metadata_url(), "/results/abc123/metadata.txt");
        assert_eq!(paths.output_video_url(), "/results/abc123/detections_video.mp4");
        assert_eq!(
            paths.frame_url("frame_0001.jpg"),
            "/results/abc123/processed_frames/frame_0001.jpg"
        );
    }
}
