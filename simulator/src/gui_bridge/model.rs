use crate::workflow::runner::RunnerError;
use serde_json::{json, Value};
use vistacore::manifest::{ConflictResponse, ErrorResponse, ProcessResponse};
use warp::http::StatusCode;

/// Status code and JSON body for the outcome of a processing request.
pub fn process_reply(result: Result<ProcessResponse, RunnerError>) -> (StatusCode, Value) {
    let encoded = match result {
        Ok(response) => serde_json::to_value(&response).map(|body| (StatusCode::OK, body)),
        Err(RunnerError::Conflict { video_id }) => {
            let error = RunnerError::Conflict {
                video_id: video_id.clone(),
            }
            .to_string();
            serde_json::to_value(ConflictResponse { error, video_id })
                .map(|body| (StatusCode::CONFLICT, body))
        }
        Err(err @ RunnerError::InvalidRequest(_)) => {
            serde_json::to_value(ErrorResponse::new(err.to_string()))
                .map(|body| (StatusCode::BAD_REQUEST, body))
        }
        Err(err @ RunnerError::Failed(_)) => {
            serde_json::to_value(ErrorResponse::new(err.to_string()))
                .map(|body| (StatusCode::INTERNAL_SERVER_ERROR, body))
        }
    };
    encoded.unwrap_or_else(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_409_with_video_id() {
        let (status, body) = process_reply(Err(RunnerError::Conflict {
            video_id: "abc123".into(),
        }));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["video_id"], "abc123");
        assert!(body["error"].as_str().unwrap().contains("abc123"));
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let (status, body) = process_reply(Err(RunnerError::InvalidRequest(
            "URL is required".into(),
        )));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "URL is required");
    }

    #[test]
    fn failures_map_to_500() {
        let (status, _) = process_reply(Err(RunnerError::Failed(anyhow::anyhow!("disk full"))));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
