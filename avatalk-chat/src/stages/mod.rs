//! Pipeline stage adapters
//!
//! Every stage wraps one external engine behind the same contract:
//! - `precondition` is a cheap, side-effect-free check of declared inputs
//! - `invoke` performs the delegated work and returns a [`StageResult`];
//!   every engine failure is classified, nothing escapes unclassified
//!
//! Adapters read only their declared inputs and write only their declared
//! output path.

pub mod render;
pub mod response;
pub mod transcription;
pub mod voice_clone;

pub use render::{RenderInput, RenderStage};
pub use response::{ResponseInput, ResponseStage};
pub use transcription::{TranscriptionInput, TranscriptionStage};
pub use voice_clone::{VoiceCloneInput, VoiceCloneStage};

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Failure taxonomy shared by stages and the provider resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// A required file/artifact was absent before the stage started
    MissingInput,
    /// The delegated engine failed, returned nonzero, or timed out
    ExternalCallFailed,
    /// The engine reported success but no artifact materialized
    OutputNotProduced,
    /// No backend with a usable API key
    UnconfiguredCredential,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::MissingInput => "missing input",
            ErrorKind::ExternalCallFailed => "external call failed",
            ErrorKind::OutputNotProduced => "output not produced",
            ErrorKind::UnconfiguredCredential => "unconfigured credential",
        };
        f.write_str(s)
    }
}

/// Classified stage failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: &'static str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}: {}", self.stage, self.kind, self.message)
    }
}

/// Result of one stage invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    Success { artifact_path: PathBuf },
    Failure { reason: StageFailure },
}

impl StageResult {
    pub fn success(artifact_path: impl Into<PathBuf>) -> Self {
        StageResult::Success {
            artifact_path: artifact_path.into(),
        }
    }

    pub fn failure(stage: &'static str, kind: ErrorKind, message: impl Into<String>) -> Self {
        StageResult::Failure {
            reason: StageFailure::new(stage, kind, message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageResult::Success { .. })
    }
}

/// Uniform contract wrapping one external engine
#[async_trait]
pub trait StageAdapter: Send + Sync {
    type Input: Send + Sync;

    /// Stage name for logs and failure reports
    fn name(&self) -> &'static str;

    /// Cheap existence/shape check of declared inputs
    fn precondition(&self, input: &Self::Input) -> bool;

    /// Run the delegated work
    async fn invoke(&self, input: &Self::Input) -> StageResult;
}

/// Write a UTF-8 text artifact, creating parent directories
pub(crate) async fn write_text_artifact(path: &std::path::Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await
}
