use crate::gui_bridge::model::process_reply;
use crate::workflow::runner::{Runner, RunnerError};
use anyhow::Context;
use log::{error, info};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, thread};
use tokio::runtime::Builder;
use vistacore::manifest::paths::RESULTS_ROUTE;
use vistacore::manifest::ProcessRequest;
use warp::{Filter, Rejection, Reply};

/// Routes the viewer talks to: processing requests, health, and the static
/// results tree.
pub fn routes(
    runner: Arc<Runner>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let results_dir = runner.config().results_dir.clone();
    let runner_filter = warp::any().map(move || runner.clone());

    let process_route = warp::path!("api" / "process")
        .and(warp::post())
        .and(warp::body::json())
        .and(runner_filter)
        .and_then(|request: ProcessRequest, runner: Arc<Runner>| async move {
            let result = tokio::task::spawn_blocking(move || runner.execute(&request))
                .await
                .unwrap_or_else(|err| {
                    Err(RunnerError::Failed(anyhow::anyhow!(
                        "processing task aborted: {}",
                        err
                    )))
                });
            if let Err(err) = &result {
                error!("process request failed: {}", err);
            }
            let (status, body) = process_reply(result);
            Ok::<_, Rejection>(warp::reply::with_status(warp::reply::json(&body), status))
        });

    let health_route = warp::path!("api" / "health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })));

    let results_route = warp::path(RESULTS_ROUTE).and(warp::fs::dir(results_dir));

    process_route.or(health_route).or(results_route)
}

/// Hosts [`routes`] on a background thread with its own runtime.
pub struct GuiBridge {
    address: SocketAddr,
}

impl GuiBridge {
    pub fn spawn(runner: Arc<Runner>) -> anyhow::Result<Self> {
        let address = runner.config().bind;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for the HTTP bridge")?;
        let routes = routes(runner);

        thread::spawn(move || {
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        });

        info!("results server listening on http://{}", address);
        Ok(Self { address })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge {}] {}", self.address, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::SimulatorConfig;
    use serde_json::Value;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use vistacore::manifest::ProcessResponse;
    use vistacore::DetectionManifest;
    use warp::http::StatusCode;

    fn runner(dir: &TempDir) -> Arc<Runner> {
        let mut config = SimulatorConfig::default();
        config.results_dir = PathBuf::from(dir.path());
        config.frame_count = 4;
        Arc::new(Runner::new(config))
    }

    fn process_body(url: &str) -> ProcessRequest {
        ProcessRequest::new(url, 0.4, 1)
    }

    #[tokio::test]
    async fn process_then_conflict_then_fetch() {
        let dir = TempDir::new().unwrap();
        let api = routes(runner(&dir));

        let first = warp::test::request()
            .method("POST")
            .path("/api/process")
            .json(&process_body("https://youtu.be/abcdef123"))
            .reply(&api)
            .await;
        assert_eq!(first.status(), StatusCode::OK);
        let response: ProcessResponse = serde_json::from_slice(first.body()).unwrap();
        assert_eq!(response.video_id, "abcdef123");

        let second = warp::test::request()
            .method("POST")
            .path("/api/process")
            .json(&process_body("https://youtu.be/abcdef123"))
            .reply(&api)
            .await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let conflict: Value = serde_json::from_slice(second.body()).unwrap();
        assert_eq!(conflict["video_id"], "abcdef123");

        let manifest = warp::test::request()
            .path("/results/abcdef123/detection_results.json")
            .reply(&api)
            .await;
        assert_eq!(manifest.status(), StatusCode::OK);
        let manifest: DetectionManifest = serde_json::from_slice(manifest.body()).unwrap();
        assert_eq!(manifest.frames.len(), 4);

        let frame = warp::test::request()
            .path("/results/abcdef123/processed_frames/frame_0001.jpg")
            .reply(&api)
            .await;
        assert_eq!(frame.status(), StatusCode::OK);
        assert!(image::load_from_memory(frame.body()).is_ok());
    }

    #[tokio::test]
    async fn missing_url_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let api = routes(runner(&dir));
        let reply = warp::test::request()
            .method("POST")
            .path("/api/process")
            .json(&json!({ "conf_threshold": 0.5 }))
            .reply(&api)
            .await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = TempDir::new().unwrap();
        let reply = warp::test::request()
            .path("/api/health")
            .reply(&routes(runner(&dir)))
            .await;
        assert_eq!(reply.status(), StatusCode::OK);
    }
}
