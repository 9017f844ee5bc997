//! Transcription stage: input WAV → recognized text file

use super::{write_text_artifact, ErrorKind, StageAdapter, StageResult};
use crate::engines::SpeechRecognizer;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const STAGE: &str = "transcription";

#[derive(Debug, Clone)]
pub struct TranscriptionInput {
    pub audio_path: PathBuf,
    pub transcript_path: PathBuf,
    /// Recognition locale, e.g. `zh-CN`
    pub locale: String,
}

pub struct TranscriptionStage {
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl TranscriptionStage {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { recognizer }
    }
}

#[async_trait]
impl StageAdapter for TranscriptionStage {
    type Input = TranscriptionInput;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn precondition(&self, input: &TranscriptionInput) -> bool {
        input.audio_path.is_file()
    }

    async fn invoke(&self, input: &TranscriptionInput) -> StageResult {
        let text = match self.recognizer.recognize(&input.audio_path, &input.locale).await {
            Ok(text) => text,
            Err(e) => {
                warn!(stage = STAGE, path = %input.audio_path.display(), "Speech recognition failed: {}", e);
                return StageResult::failure(STAGE, e.kind(), e.to_string());
            }
        };

        if text.trim().is_empty() {
            warn!(stage = STAGE, "Speech recognition returned no text");
            return StageResult::failure(STAGE, ErrorKind::ExternalCallFailed, "no speech recognized");
        }

        if let Err(e) = write_text_artifact(&input.transcript_path, &text).await {
            warn!(stage = STAGE, path = %input.transcript_path.display(), "Failed to write transcript: {}", e);
            return StageResult::failure(STAGE, ErrorKind::OutputNotProduced, e.to_string());
        }

        info!(stage = STAGE, path = %input.transcript_path.display(), "Recognized: {}", text);
        StageResult::success(input.transcript_path.clone())
    }
}
