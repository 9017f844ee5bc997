//! Chat pipeline endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::pipeline::{PipelineRequest, PipelineState};
use crate::stages::StageFailure;
use crate::AppState;

/// POST /chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub run_id: Uuid,
    /// Video to play; relative to the service root when under it
    pub video_path: String,
    pub degraded: bool,
    pub states: Vec<PipelineState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
}

/// POST /chat
///
/// Runs the full pipeline against the recorded input audio. Always answers
/// 200 with a playable video path; a failed stage only sets `degraded`.
/// Parameters of the wrong type fall back to their defaults.
pub async fn chat(
    State(state): State<AppState>,
    Json(params): Json<HashMap<String, Value>>,
) -> Json<ChatResponse> {
    let request = PipelineRequest::from_map(&params);
    let _guard = state.run_lock.lock().await;
    let run = state.controller.run(&request).await;

    {
        let mut last_error = state.last_error.write().await;
        if let Some(failure) = &run.failure {
            *last_error = Some(failure.to_string());
        }
    }

    let root = state.controller.paths().root();
    let outcome = run
        .outcome
        .clone()
        .unwrap_or_else(|| state.controller.paths().sentinel_video());

    info!(run_id = %run.run_id, degraded = run.is_degraded(), "Chat request finished");

    Json(ChatResponse {
        run_id: run.run_id,
        video_path: display_path(root, &outcome),
        degraded: run.is_degraded(),
        states: run.states,
        failure: run.failure,
    })
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Build chat routes
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_relative_to_root() {
        assert_eq!(
            display_path(Path::new("/srv"), Path::new("/srv/static/videos/a.mp4")),
            "static/videos/a.mp4"
        );
        assert_eq!(display_path(Path::new("/srv"), Path::new("/tmp/a.mp4")), "/tmp/a.mp4");
    }
}
