//! Direct language-model query endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::providers::{query_llm, PRIMARY_BACKEND};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct LlmQueryRequest {
    pub text: String,
    #[serde(default = "default_api_choice")]
    pub api_choice: String,
}

fn default_api_choice() -> String {
    PRIMARY_BACKEND.name().to_string()
}

#[derive(Debug, Serialize)]
pub struct LlmQueryResponse {
    pub reply: String,
}

/// POST /llm/query
///
/// Unconfigured credentials and connection failures come back as reply text,
/// not as HTTP errors.
pub async fn llm_query(
    State(state): State<AppState>,
    Json(request): Json<LlmQueryRequest>,
) -> ApiResult<Json<LlmQueryResponse>> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let reply = query_llm(
        state.providers.as_ref(),
        state.chat.as_ref(),
        text,
        &request.api_choice,
    )
    .await;

    Ok(Json(LlmQueryResponse { reply }))
}

/// Build LLM routes
pub fn llm_routes() -> Router<AppState> {
    Router::new().route("/llm/query", post(llm_query))
}
