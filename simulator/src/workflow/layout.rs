use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use vistacore::manifest::paths::{DETECTION_JSON, METADATA_TXT, PROCESSED_FRAMES};

/// On-disk artifact locations for one video under the results directory.
#[derive(Debug, Clone)]
pub struct ResultsLayout {
    pub base: PathBuf,
    pub detection_json: PathBuf,
    pub processed_frames: PathBuf,
    pub metadata_txt: PathBuf,
}

impl ResultsLayout {
    pub fn new(results_dir: &Path, video_id: &str) -> Self {
        let base = results_dir.join(video_id);
        Self {
            detection_json: base.join(DETECTION_JSON),
            processed_frames: base.join(PROCESSED_FRAMES),
            metadata_txt: base.join(METADATA_TXT),
            base,
        }
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.processed_frames)
    }

    /// A manifest exists, or annotated frames were already written.
    pub fn has_existing_results(&self) -> bool {
        if self.detection_json.exists() {
            return true;
        }
        fs::read_dir(&self.processed_frames)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    pub fn frame_path(&self, frame_name: &str) -> PathBuf {
        self.processed_frames.join(frame_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fresh_layout_has_no_results() {
        let dir = TempDir::new().unwrap();
        let layout = ResultsLayout::new(dir.path(), "abc123");
        assert!(!layout.has_existing_results());
        layout.ensure_dirs().unwrap();
        assert!(layout.processed_frames.is_dir());
        assert!(!layout.has_existing_results());
    }

    #[test]
    fn any_written_frame_counts_as_existing() {
        let dir = TempDir::new().unwrap();
        let layout = ResultsLayout::new(dir.path(), "abc123");
        layout.ensure_dirs().unwrap();
        fs::write(layout.frame_path("frame_0001.jpg"), b"x").unwrap();
        assert!(layout.has_existing_results());
    }
}
