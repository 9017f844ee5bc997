//! avatalk-chat library interface
//!
//! Talking-head chat pipeline: speech → transcript → language-model reply →
//! cloned voice → rendered video, with multi-provider backend resolution.

pub mod api;
pub mod config;
pub mod engines;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod stages;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use engines::ChatBackend;
use pipeline::PipelineController;
use providers::ConfigSource;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<PipelineController>,
    /// Provider configuration, reloaded per request
    pub providers: Arc<dyn ConfigSource>,
    /// Chat engine used by direct LLM queries
    pub chat: Arc<dyn ChatBackend>,
    /// Serializes pipeline runs; intermediate artifacts live at fixed paths
    pub run_lock: Arc<Mutex<()>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last degraded run, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        controller: PipelineController,
        providers: Arc<dyn ConfigSource>,
        chat: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            controller: Arc::new(controller),
            providers,
            chat,
            run_lock: Arc::new(Mutex::new(())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::chat_routes())
        .merge(api::llm_routes())
        .merge(api::provider_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
