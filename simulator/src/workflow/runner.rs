use crate::generator::profile::{build_detection_profile, filter_by_confidence};
use crate::generator::template::paint_frame;
use crate::workflow::config::SimulatorConfig;
use crate::workflow::layout::ResultsLayout;
use crate::workflow::video_id::derive_video_id;
use anyhow::Context;
use log::info;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex, PoisonError};
use vistacore::manifest::{
    DetectionManifest, ProcessRequest, ProcessResponse, ResultPaths, ResultUrls, VideoMetadata,
};
use vistacore::{DetectionIndexBuilder, Summary};

const MODEL_NAME: &str = "synthetic-detector";
const DEVICE: &str = "cpu";

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Existing results found for video_id '{video_id}'. Remove them or use a different URL.")]
    Conflict { video_id: String },
    #[error("{0:#}")]
    Failed(#[from] anyhow::Error),
}

/// Runs one synthetic detection job and writes its artifacts.
///
/// Clones share the set of video ids currently being processed, so two
/// concurrent requests for one id cannot both write results.
#[derive(Clone)]
pub struct Runner {
    config: SimulatorConfig,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Marks a video id as being processed until dropped.
struct RunClaim<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    video_id: String,
}

impl Drop for RunClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.video_id);
    }
}

impl Runner {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            in_flight: Arc::default(),
        }
    }

    fn claim(&self, video_id: &str) -> Option<RunClaim<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.insert(video_id.to_string()).then(|| RunClaim {
            in_flight: &self.in_flight,
            video_id: video_id.to_string(),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn execute(&self, request: &ProcessRequest) -> Result<ProcessResponse, RunnerError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(RunnerError::InvalidRequest("URL is required".into()));
        }
        if !request.conf_threshold.is_finite() {
            return Err(RunnerError::InvalidRequest("conf_threshold must be a number".into()));
        }
        let video_id = derive_video_id(url).ok_or_else(|| {
            RunnerError::InvalidRequest("Invalid or unsupported video ID derived from URL".into())
        })?;

        let _claim = match self.claim(&video_id) {
            Some(claim) => claim,
            None => return Err(RunnerError::Conflict { video_id }),
        };

        let layout = ResultsLayout::new(&self.config.results_dir, &video_id);
        layout
            .ensure_dirs()
            .with_context(|| format!("creating results directories for {}", video_id))?;
        if layout.has_existing_results() {
            return Err(RunnerError::Conflict { video_id });
        }

        let generator = self.config.to_generator_config(&video_id);
        let mut frames = filter_by_confidence(
            build_detection_profile(&generator),
            request.conf_threshold,
        );
        frames.sort_by(|left, right| left.name.cmp(&right.name));

        for (position, frame) in frames.iter().enumerate() {
            let bytes = paint_frame(
                generator.frame_width,
                generator.frame_height,
                position,
                &frame.detections,
            )?;
            fs::write(layout.frame_path(&frame.name), bytes)
                .with_context(|| format!("writing frame {}", frame.name))?;
        }

        let manifest = DetectionManifest {
            video_id: Some(video_id.clone()),
            confidence_threshold: request.conf_threshold,
            frames,
        };
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&layout.detection_json)
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(RunnerError::Conflict { video_id });
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("creating {}", layout.detection_json.display()))
                    .into())
            }
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &manifest).context("writing detection results")?;
        writer.flush().context("flushing detection results")?;

        let (_, summary) = DetectionIndexBuilder::new().build(&manifest);
        fs::write(
            &layout.metadata_txt,
            metadata_text(&video_id, url, request.conf_threshold, &summary),
        )
        .with_context(|| format!("writing {}", layout.metadata_txt.display()))?;

        info!(
            "processed {} -> {} frames, {} detections",
            video_id, summary.total_frames, summary.total_detections
        );

        let paths = ResultPaths::new(video_id.as_str());
        Ok(ProcessResponse {
            status: "completed".into(),
            metadata: VideoMetadata {
                title: None,
                // frames are sampled once per second
                duration: Some(summary.total_frames as f64),
                thumbnail: None,
            },
            summary: summary.to_payload(request.conf_threshold),
            // no video encoder here, so there is no rendered video to link
            results: ResultUrls {
                output_video_url: None,
                ..paths.result_urls()
            },
            video_id,
        })
    }
}

/// Plain-text run description stored next to the manifest.
pub fn metadata_text(
    video_id: &str,
    source: &str,
    conf_threshold: f64,
    summary: &Summary,
) -> String {
    let mut lines = vec![
        format!("video_id: {}", video_id),
        format!("source: {}", source),
        format!("confidence_threshold: {}", conf_threshold),
        format!("total_frames: {}", summary.total_frames),
        format!("total_detections: {}", summary.total_detections),
        format!("model: {}", MODEL_NAME),
        format!("device: {}", DEVICE),
        "class_counts:".to_string(),
    ];
    lines.extend(
        summary
            .by_class
            .iter()
            .map(|(class, count)| format!("  {}: {}", class, count)),
    );
    lines.join("\n") + "\n"
}
