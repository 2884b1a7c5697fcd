use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use vistacore::manifest::ProcessRequest;
use vistacore::{DetectionIndexBuilder, DetectionManifest};
use workflow::config::SimulatorConfig;
use workflow::runner::{Runner, RunnerError};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic detection backend for the frame viewer")]
struct Args {
    /// Load a simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "vista-prototype/results")]
    results_dir: PathBuf,
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
    #[arg(long, default_value_t = 12)]
    frames: usize,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Process one video URL without starting the server
    #[arg(long)]
    offline: Option<String>,
    #[arg(long, default_value_t = 0.7)]
    conf_threshold: f64,
    /// Print the summary of an existing detection manifest
    #[arg(long)]
    inspect: Option<PathBuf>,
    /// Serve the processing API and the results tree until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = &args.config {
        SimulatorConfig::load(path)?
    } else {
        SimulatorConfig::from_args(args.results_dir.clone(), args.bind, args.frames, args.seed)
    };

    if let Some(path) = &args.inspect {
        inspect(path)?;
    }

    let runner = Runner::new(config);

    if let Some(url) = &args.offline {
        let request = ProcessRequest::new(url.as_str(), args.conf_threshold, 1);
        match runner.execute(&request) {
            Ok(response) => {
                println!(
                    "Offline run -> video {}, frames {}, detections {}",
                    response.video_id,
                    response.summary.total_frames,
                    response.summary.total_detections
                );
                for (class, count) in &response.summary.by_class {
                    println!("  {}: {}", class, count);
                }
            }
            Err(RunnerError::Conflict { video_id }) => {
                println!("Results for {} already exist; leaving them in place.", video_id);
            }
            Err(err) => return Err(err).context("offline run failed"),
        }
    }

    if args.serve {
        let bridge = GuiBridge::spawn(Arc::new(runner))?;
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let manifest = DetectionManifest::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    let (index, summary) = DetectionIndexBuilder::new().build(&manifest);

    println!(
        "{}: {} frames, {} detections, threshold {}",
        manifest.video_id.as_deref().unwrap_or("(unnamed)"),
        summary.total_frames,
        summary.total_detections,
        manifest.confidence_threshold
    );
    for class in index.classes() {
        let frames = index.ordered_frames(class);
        println!(
            "  {}: {} detections across {} frames",
            class,
            summary.by_class.get(class).copied().unwrap_or_default(),
            frames.len()
        );
    }
    Ok(())
}
