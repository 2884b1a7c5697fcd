use log::{debug, warn};
use reqwest::StatusCode;
use std::future::Future;
use vistacore::manifest::{
    ConflictResponse, ErrorResponse, ProcessRequest, ProcessResponse, ResultPaths,
};
use vistacore::prelude::{FrameFetcher, ViewerError, ViewerResult};
use vistacore::DetectionManifest;

/// How the backend answered a processing request.
#[derive(Debug, Clone)]
pub enum Submission {
    Completed(ProcessResponse),
    /// Results for this video were already on disk.
    Existing { video_id: String, message: String },
}

/// Talks to the processing backend and its static results tree.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    server: String,
}

impl BackendClient {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            server: server.into().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for a server-relative path.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.server, path)
    }

    pub async fn process(self, request: ProcessRequest) -> Result<Submission, String> {
        let response = self
            .http
            .post(self.url("/api/process"))
            .json(&request)
            .send()
            .await
            .map_err(|err| format!("backend unreachable: {err}"))?;
        let status = response.status();
        match status {
            StatusCode::OK => response
                .json::<ProcessResponse>()
                .await
                .map(Submission::Completed)
                .map_err(|err| format!("unreadable processing reply: {err}")),
            StatusCode::CONFLICT => {
                let conflict = response
                    .json::<ConflictResponse>()
                    .await
                    .map_err(|err| format!("unreadable conflict reply: {err}"))?;
                debug!("results for {} already exist", conflict.video_id);
                Ok(Submission::Existing {
                    video_id: conflict.video_id,
                    message: conflict.error,
                })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&body)
                    .map(|reply| reply.error)
                    .unwrap_or(body);
                Err(format!("{status}: {message}"))
            }
        }
    }

    pub async fn manifest(self, video_id: String) -> Result<DetectionManifest, String> {
        let url = self.url(&ResultPaths::new(video_id.as_str()).manifest_url());
        let body = get_bytes(&self.http, &url)
            .await
            .map_err(|err| err.to_string())?;
        let text = String::from_utf8_lossy(&body);
        DetectionManifest::from_json(&text).map_err(|err| {
            warn!("manifest for {} rejected: {}", video_id, err);
            err.to_string()
        })
    }

    pub fn frame_fetcher(&self, video_id: &str) -> HttpFrameFetcher {
        HttpFrameFetcher {
            http: self.http.clone(),
            server: self.server.clone(),
            paths: ResultPaths::new(video_id),
        }
    }
}

/// Loads processed frames of one video over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFrameFetcher {
    http: reqwest::Client,
    server: String,
    paths: ResultPaths,
}

impl HttpFrameFetcher {
    pub fn frame_url(&self, frame_name: &str) -> String {
        join_url(&self.server, &self.paths.frame_url(frame_name))
    }
}

impl FrameFetcher for HttpFrameFetcher {
    fn fetch(&self, frame_name: &str) -> impl Future<Output = ViewerResult<Vec<u8>>> + Send {
        let http = self.http.clone();
        let url = self.frame_url(frame_name);
        async move { get_bytes(&http, &url).await }
    }
}

async fn get_bytes(http: &reqwest::Client, url: &str) -> ViewerResult<Vec<u8>> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|err| ViewerError::Transport(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ViewerError::Transport(format!("{url} returned {status}")));
    }
    let body = response
        .bytes()
        .await
        .map_err(|err| ViewerError::Transport(err.to_string()))?;
    Ok(body.to_vec())
}

fn join_url(server: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{server}{path}")
    } else {
        format!("{server}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let client = BackendClient::new("http://127.0.0.1:8000/");
        assert_eq!(client.url("/api/process"), "http://127.0.0.1:8000/api/process");
        assert_eq!(client.url("api/health"), "http://127.0.0.1:8000/api/health");
    }

    #[test]
    fn frame_urls_point_at_processed_frames() {
        let fetcher = BackendClient::new("http://localhost:8000").frame_fetcher("abc123");
        assert_eq!(
            fetcher.frame_url("frame_0002.jpg"),
            "http://localhost:8000/results/abc123/processed_frames/frame_0002.jpg"
        );
    }
}
