use crate::index::frame_order::sort_frames;
use crate::manifest::{Detection, DetectionManifest, SummaryPayload};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type FrameDetections = BTreeMap<String, Vec<Detection>>;

/// Class name → frame name → detections of that class in that frame.
///
/// Built in one pass over a manifest and never patched afterwards; a new
/// manifest produces a new index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectIndex {
    classes: BTreeMap<String, FrameDetections>,
}

impl ObjectIndex {
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn contains_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Frames containing `class`, in natural frame order. Unknown classes
    /// yield an empty list.
    pub fn ordered_frames(&self, class: &str) -> Vec<String> {
        let mut frames: Vec<String> = self
            .classes
            .get(class)
            .map(|frames| frames.keys().cloned().collect())
            .unwrap_or_default();
        sort_frames(&mut frames);
        frames
    }

    pub fn detections(&self, class: &str, frame: &str) -> &[Detection] {
        self.classes
            .get(class)
            .and_then(|frames| frames.get(frame))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_detections(&self) -> usize {
        self.classes
            .values()
            .flat_map(|frames| frames.values())
            .map(Vec::len)
            .sum()
    }

    fn push(&mut self, class: String, frame: &str, detection: Detection) {
        self.classes
            .entry(class)
            .or_default()
            .entry(frame.to_string())
            .or_default()
            .push(detection);
    }
}

/// Aggregate counts over a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_frames: usize,
    pub total_detections: usize,
    pub by_class: BTreeMap<String, usize>,
}

impl Summary {
    pub fn to_payload(&self, confidence_threshold: f64) -> SummaryPayload {
        SummaryPayload {
            confidence_threshold,
            total_frames: self.total_frames,
            total_detections: self.total_detections,
            by_class: self.by_class.clone(),
        }
    }
}

/// Turns a detection manifest into an [`ObjectIndex`] and its [`Summary`].
pub struct DetectionIndexBuilder {
    logger: LogManager,
}

impl DetectionIndexBuilder {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new(),
        }
    }

    pub fn build(&self, manifest: &DetectionManifest) -> (ObjectIndex, Summary) {
        let mut index = ObjectIndex::default();
        let mut summary = Summary::default();

        for frame in &manifest.frames {
            summary.total_frames += 1;
            for raw in &frame.detections {
                let class = raw.class_name();
                *summary.by_class.entry(class.clone()).or_insert(0) += 1;
                summary.total_detections += 1;
                index.push(class, &frame.name, raw.normalize());
            }
        }

        self.logger.trace(&format!(
            "indexed {} frames, {} detections across {} classes",
            summary.total_frames,
            summary.total_detections,
            summary.by_class.len()
        ));
        (index, summary)
    }
}

impl Default for DetectionIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{FrameRecord, RawDetection};
    use serde_json::json;

    fn manifest(frames: Vec<FrameRecord>) -> DetectionManifest {
        DetectionManifest {
            video_id: None,
            confidence_threshold: 0.5,
            frames,
        }
    }

    #[test]
    fn builds_index_and_summary_for_scenario() {
        let manifest = manifest(vec![
            FrameRecord::new(
                "frame_1.jpg",
                vec![RawDetection::new("car", [1.0, 2.0, 3.0, 4.0], 0.9)],
            ),
            FrameRecord::new("frame_2.jpg", Vec::new()),
        ]);
        let (index, summary) = DetectionIndexBuilder::new().build(&manifest);

        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.total_detections, 1);
        assert_eq!(summary.by_class.get("car"), Some(&1));
        assert_eq!(index.ordered_frames("car"), vec!["frame_1.jpg"]);
        assert_eq!(
            index.detections("car", "frame_1.jpg"),
            &[Detection {
                bbox: [1.0, 2.0, 3.0, 4.0],
                conf: 0.9
            }]
        );
    }

    #[test]
    fn empty_manifest_yields_zero_counts() {
        let (index, summary) = DetectionIndexBuilder::new().build(&DetectionManifest::default());
        assert_eq!(summary, Summary::default());
        assert_eq!(index.classes().count(), 0);
        assert!(index.ordered_frames("car").is_empty());
    }

    #[test]
    fn repeated_frame_names_accumulate() {
        let manifest = manifest(vec![
            FrameRecord::new(
                "frame_5.jpg",
                vec![
                    RawDetection::new("person", [0.0, 0.0, 1.0, 1.0], 0.8),
                    RawDetection::new("person", [2.0, 2.0, 3.0, 3.0], 0.7),
                ],
            ),
            FrameRecord::new(
                "frame_5.jpg",
                vec![RawDetection::new("person", [4.0, 4.0, 5.0, 5.0], 0.6)],
            ),
        ]);
        let (index, summary) = DetectionIndexBuilder::new().build(&manifest);
        let confs: Vec<f64> = index
            .detections("person", "frame_5.jpg")
            .iter()
            .map(|detection| detection.conf)
            .collect();
        assert_eq!(confs, vec![0.8, 0.7, 0.6]);
        assert_eq!(summary.total_frames, 2);
        assert_eq!(index.ordered_frames("person").len(), 1);
    }

    #[test]
    fn counts_stay_consistent_with_odd_records() {
        let manifest = manifest(vec![FrameRecord::new(
            "frame_9.jpg",
            vec![
                RawDetection {
                    class: json!(""),
                    bbox: json!(["a"]),
                    conf: json!(null),
                },
                RawDetection::default(),
                RawDetection::new("dog", [1.0, 1.0, 2.0, 2.0], 0.4),
            ],
        )]);
        let (index, summary) = DetectionIndexBuilder::new().build(&manifest);

        assert_eq!(summary.by_class.get("unknown"), Some(&2));
        assert_eq!(
            summary.by_class.values().sum::<usize>(),
            summary.total_detections
        );
        assert_eq!(index.total_detections(), manifest.total_detections());
    }

    #[test]
    fn build_is_repeatable() {
        let manifest = manifest(vec![FrameRecord::new(
            "frame_1.jpg",
            vec![RawDetection::new("car", [1.0, 2.0, 3.0, 4.0], 0.9)],
        )]);
        let builder = DetectionIndexBuilder::new();
        assert_eq!(builder.build(&manifest), builder.build(&manifest));
    }

    #[test]
    fn summary_converts_to_payload() {
        let manifest = manifest(vec![FrameRecord::new(
            "frame_1.jpg",
            vec![RawDetection::new("car", [1.0, 2.0, 3.0, 4.0], 0.9)],
        )]);
        let (_, summary) = DetectionIndexBuilder::new().build(&manifest);
        let payload = summary.to_payload(0.5);
        assert_eq!(payload.confidence_threshold, 0.5);
        assert_eq!(payload.total_detections, 1);
    }
}
