//! Pipeline controller
//!
//! # State Progression
//! IDLE → TRANSCRIBING → RESPONDING → CLONING → RENDERING → DONE
//!
//! Each state runs one stage adapter. A failing precondition or a
//! `StageResult::Failure` moves the run to DEGRADED and the sentinel video is
//! returned. Nothing is retried; the controller keeps no state between runs.

use super::paths::PipelinePaths;
use super::request::PipelineRequest;
use super::state::{PipelineRun, PipelineState};
use crate::engines::{ChatBackend, SpeechRecognizer, VideoRenderer, VoiceCloner};
use crate::providers::ConfigSource;
use crate::stages::{
    ErrorKind, RenderInput, RenderStage, ResponseInput, ResponseStage, StageAdapter,
    StageFailure, StageResult, TranscriptionInput, TranscriptionStage, VoiceCloneInput,
    VoiceCloneStage,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// ASR locale for recorded input
pub const RECOGNITION_LOCALE: &str = "zh-CN";

/// Synthesis language for the cloned voice
pub const CLONE_LANGUAGE: &str = "zh";

/// External collaborators driven by the pipeline
#[derive(Clone)]
pub struct Engines {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub providers: Arc<dyn ConfigSource>,
    pub chat: Arc<dyn ChatBackend>,
    pub cloner: Arc<dyn VoiceCloner>,
    pub renderer: Arc<dyn VideoRenderer>,
}

/// Pipeline controller service
pub struct PipelineController {
    paths: PipelinePaths,
    transcription: TranscriptionStage,
    response: ResponseStage,
    voice_clone: VoiceCloneStage,
    render: RenderStage,
}

impl PipelineController {
    pub fn new(paths: PipelinePaths, engines: Engines) -> Self {
        Self {
            paths,
            transcription: TranscriptionStage::new(engines.recognizer),
            response: ResponseStage::new(engines.providers, engines.chat),
            voice_clone: VoiceCloneStage::new(engines.cloner),
            render: RenderStage::new(engines.renderer),
        }
    }

    pub fn paths(&self) -> &PipelinePaths {
        &self.paths
    }

    /// Run the full pipeline for one request
    ///
    /// Always yields an outcome path: the new video on success, the sentinel
    /// video otherwise.
    pub async fn run(&self, request: &PipelineRequest) -> PipelineRun {
        let mut run = PipelineRun::new();
        info!(run_id = %run.run_id, api_choice = %request.api_choice, "Pipeline run started");

        let input_audio = self.paths.input_audio();
        if !input_audio.is_file() {
            warn!(run_id = %run.run_id, path = %input_audio.display(), "Input audio missing");
            let failure = StageFailure::new(
                self.transcription.name(),
                ErrorKind::MissingInput,
                input_audio.display().to_string(),
            );
            run.degrade(failure, self.paths.sentinel_video());
            return run;
        }

        // TRANSCRIBING
        let transcription = TranscriptionInput {
            audio_path: input_audio,
            transcript_path: self.paths.transcript(),
            locale: RECOGNITION_LOCALE.to_string(),
        };
        let Some(transcript) = self
            .step(&mut run, PipelineState::Transcribing, &self.transcription, &transcription)
            .await
        else {
            return run;
        };

        // RESPONDING
        let response = ResponseInput {
            transcript_path: transcript,
            reply_path: self.paths.reply(),
            api_choice: request.api_choice.clone(),
        };
        let Some(reply) = self
            .step(&mut run, PipelineState::Responding, &self.response, &response)
            .await
        else {
            return run;
        };

        // CLONING
        let voice_clone = VoiceCloneInput {
            reply_path: reply,
            reference_audio: self.paths.reference_voice(request.voice_clone.as_deref()),
            output_path: self.paths.cloned_audio(),
            language: CLONE_LANGUAGE.to_string(),
        };
        let Some(cloned_audio) = self
            .step(&mut run, PipelineState::Cloning, &self.voice_clone, &voice_clone)
            .await
        else {
            return run;
        };

        // RENDERING
        let render = RenderInput {
            audio_path: cloned_audio,
            checkpoint: request.model_param.clone(),
            dataset_path: request.dataset_path.clone(),
            device: request.gpu_choice.clone(),
            feature_extractor: request.audio_extractor.clone(),
            output_path: self.paths.fresh_video(),
        };
        let Some(video) = self
            .step(&mut run, PipelineState::Rendering, &self.render, &render)
            .await
        else {
            return run;
        };

        run.complete(video.clone());
        info!(
            run_id = %run.run_id,
            path = %video.display(),
            elapsed_ms = run.elapsed_ms(),
            "Pipeline run completed"
        );
        run
    }

    /// Enter `state`, run `stage`, and return its artifact
    ///
    /// Returns `None` after moving the run to DEGRADED.
    async fn step<S: StageAdapter>(
        &self,
        run: &mut PipelineRun,
        state: PipelineState,
        stage: &S,
        input: &S::Input,
    ) -> Option<PathBuf> {
        let transition = run.transition_to(state);
        info!(
            run_id = %run.run_id,
            stage = stage.name(),
            "{:?} → {:?}",
            transition.old_state,
            transition.new_state
        );

        if !stage.precondition(input) {
            let failure =
                StageFailure::new(stage.name(), ErrorKind::MissingInput, "precondition not met");
            self.absorb(run, failure);
            return None;
        }

        match stage.invoke(input).await {
            StageResult::Success { artifact_path } => Some(artifact_path),
            StageResult::Failure { reason } => {
                self.absorb(run, reason);
                None
            }
        }
    }

    fn absorb(&self, run: &mut PipelineRun, mut failure: StageFailure) {
        // The state machine treats every failure uniformly
        if failure.kind == ErrorKind::UnconfiguredCredential {
            failure.kind = ErrorKind::ExternalCallFailed;
        }
        warn!(
            run_id = %run.run_id,
            stage = failure.stage,
            kind = %failure.kind,
            "Pipeline degraded: {}",
            failure.message
        );
        run.degrade(failure, self.paths.sentinel_video());
    }
}
