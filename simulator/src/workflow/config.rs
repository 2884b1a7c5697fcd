use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub results_dir: PathBuf,
    pub bind: SocketAddr,
    pub frame_count: usize,
    pub classes: Vec<String>,
    pub seed: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub max_detections_per_frame: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("vista-prototype/results"),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            frame_count: 12,
            classes: ["person", "car", "bicycle", "dog", "truck"]
                .iter()
                .map(|class| class.to_string())
                .collect(),
            seed: 7,
            frame_width: 320,
            frame_height: 180,
            max_detections_per_frame: 4,
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(results_dir: PathBuf, bind: SocketAddr, frame_count: usize, seed: u64) -> Self {
        Self {
            results_dir,
            bind,
            frame_count,
            seed,
            ..Default::default()
        }
    }

    /// Generator settings for one video; the id perturbs the seed so that
    /// different videos get different runs.
    pub fn to_generator_config(&self, video_id: &str) -> GeneratorConfig {
        let id_hash = video_id
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            });
        GeneratorConfig {
            frame_count: self.frame_count,
            classes: self.classes.clone(),
            seed: self.seed ^ id_hash,
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            max_detections_per_frame: self.max_detections_per_frame,
        }
    }
}
