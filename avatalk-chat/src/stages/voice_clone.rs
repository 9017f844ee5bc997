//! Voice clone stage: reply text → WAV in the reference speaker's voice

use super::{ErrorKind, StageAdapter, StageResult};
use crate::engines::{CloneJob, VoiceCloner};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const STAGE: &str = "voice_clone";

#[derive(Debug, Clone)]
pub struct VoiceCloneInput {
    pub reply_path: PathBuf,
    /// Already resolved to an existing file or the default reference
    pub reference_audio: PathBuf,
    pub output_path: PathBuf,
    pub language: String,
}

pub struct VoiceCloneStage {
    cloner: Arc<dyn VoiceCloner>,
}

impl VoiceCloneStage {
    pub fn new(cloner: Arc<dyn VoiceCloner>) -> Self {
        Self { cloner }
    }
}

#[async_trait]
impl StageAdapter for VoiceCloneStage {
    type Input = VoiceCloneInput;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn precondition(&self, input: &VoiceCloneInput) -> bool {
        input.reply_path.is_file() && input.reference_audio.is_file()
    }

    async fn invoke(&self, input: &VoiceCloneInput) -> StageResult {
        let text = match tokio::fs::read_to_string(&input.reply_path).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(stage = STAGE, path = %input.reply_path.display(), "Cannot read reply: {}", e);
                return StageResult::failure(STAGE, ErrorKind::MissingInput, e.to_string());
            }
        };

        let job = CloneJob {
            text,
            reference_audio: input.reference_audio.clone(),
            output_path: input.output_path.clone(),
            language: input.language.clone(),
        };

        match self.cloner.clone_voice(&job).await {
            Ok(Some(path)) if path.is_file() => {
                info!(stage = STAGE, path = %path.display(), "Cloned audio ready");
                StageResult::success(path)
            }
            Ok(Some(path)) => {
                warn!(stage = STAGE, path = %path.display(), "Clone engine returned a path that does not exist");
                StageResult::failure(STAGE, ErrorKind::OutputNotProduced, path.display().to_string())
            }
            Ok(None) => {
                warn!(stage = STAGE, "Clone engine produced no audio");
                StageResult::failure(
                    STAGE,
                    ErrorKind::OutputNotProduced,
                    format!("no audio for {}", input.output_path.display()),
                )
            }
            Err(e) => {
                warn!(stage = STAGE, reference = %input.reference_audio.display(), "Voice clone failed: {}", e);
                StageResult::failure(STAGE, e.kind(), e.to_string())
            }
        }
    }
}
