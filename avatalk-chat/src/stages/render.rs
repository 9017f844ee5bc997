//! Render stage: cloned audio → talking-head video

use super::{ErrorKind, StageAdapter, StageResult};
use crate::engines::{RenderJob, VideoRenderer};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const STAGE: &str = "render";

/// Render model driven by this stage
pub const RENDER_MODEL: &str = "TalkingGaussian";

#[derive(Debug, Clone)]
pub struct RenderInput {
    pub audio_path: PathBuf,
    pub checkpoint: String,
    pub dataset_path: String,
    pub device: String,
    pub feature_extractor: String,
    /// Fresh, run-specific video path
    pub output_path: PathBuf,
}

pub struct RenderStage {
    renderer: Arc<dyn VideoRenderer>,
}

impl RenderStage {
    pub fn new(renderer: Arc<dyn VideoRenderer>) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl StageAdapter for RenderStage {
    type Input = RenderInput;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn precondition(&self, input: &RenderInput) -> bool {
        input.audio_path.is_file() && !input.checkpoint.trim().is_empty()
    }

    async fn invoke(&self, input: &RenderInput) -> StageResult {
        let job = RenderJob {
            model_name: RENDER_MODEL.to_string(),
            checkpoint: input.checkpoint.clone(),
            reference_audio: input.audio_path.clone(),
            dataset_path: input.dataset_path.clone(),
            device: input.device.clone(),
            feature_extractor: input.feature_extractor.clone(),
            output_path: input.output_path.clone(),
        };

        match self.renderer.render(&job).await {
            Ok(video) if video.is_file() => {
                info!(stage = STAGE, path = %video.display(), "Video rendered");
                StageResult::success(video)
            }
            Ok(video) => {
                warn!(stage = STAGE, path = %video.display(), "Renderer reported a video that does not exist");
                StageResult::failure(STAGE, ErrorKind::OutputNotProduced, video.display().to_string())
            }
            Err(e) => {
                warn!(stage = STAGE, checkpoint = %input.checkpoint, "Render failed: {}", e);
                StageResult::failure(STAGE, e.kind(), e.to_string())
            }
        }
    }
}
