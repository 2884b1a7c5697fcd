use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use vistacore::manifest::{FrameRecord, RawDetection};

/// Configuration for generating a synthetic detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub frame_count: usize,
    pub classes: Vec<String>,
    pub seed: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub max_detections_per_frame: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            frame_count: 12,
            classes: vec!["person".into(), "car".into()],
            seed: 0,
            frame_width: 320,
            frame_height: 180,
            max_detections_per_frame: 4,
        }
    }
}

impl GeneratorConfig {
    fn normalized_width(&self) -> u32 {
        self.frame_width.max(16)
    }

    fn normalized_height(&self) -> u32 {
        self.frame_height.max(16)
    }
}

/// Name of the 1-based `index`-th sampled frame.
pub fn frame_name(index: usize) -> String {
    format!("frame_{:04}.jpg", index)
}

fn random_detection(config: &GeneratorConfig, rng: &mut StdRng) -> RawDetection {
    let width = config.normalized_width();
    let height = config.normalized_height();
    let class = if config.classes.is_empty() {
        "object"
    } else {
        config.classes[rng.gen_range(0..config.classes.len())].as_str()
    };

    let box_w = rng.gen_range(width / 10..=width / 3);
    let box_h = rng.gen_range(height / 10..=height / 3);
    let x1 = rng.gen_range(0..width - box_w);
    let y1 = rng.gen_range(0..height - box_h);
    let conf: f64 = rng.gen_range(0.3..1.0);

    RawDetection::new(
        class,
        [
            f64::from(x1),
            f64::from(y1),
            f64::from(x1 + box_w),
            f64::from(y1 + box_h),
        ],
        (conf * 1000.0).round() / 1000.0,
    )
}

/// Every detection of the run, before any confidence filtering.
pub fn build_detection_profile(config: &GeneratorConfig) -> Vec<FrameRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (1..=config.frame_count)
        .map(|index| {
            let count = rng.gen_range(0..=config.max_detections_per_frame);
            let detections = (0..count)
                .map(|_| random_detection(config, &mut rng))
                .collect();
            FrameRecord::new(frame_name(index), detections)
        })
        .collect()
}

/// Keeps detections whose confidence reaches `threshold`.
pub fn filter_by_confidence(frames: Vec<FrameRecord>, threshold: f64) -> Vec<FrameRecord> {
    frames
        .into_iter()
        .map(|frame| FrameRecord {
            detections: frame
                .detections
                .into_iter()
                .filter(|detection| detection.normalized_conf() >= threshold)
                .collect(),
            ..frame
        })
        .collect()
}
