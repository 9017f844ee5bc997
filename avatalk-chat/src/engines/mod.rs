//! Delegated engine contracts
//!
//! Each pipeline stage hands its work to one external engine. The traits
//! below are the only surface the stages see; concrete implementations talk
//! HTTP (speech recognition, chat completion) or launch subprocesses
//! (voice cloning, video rendering).

pub mod cosyvoice;
pub mod openai_chat;
pub mod talking_gaussian;
pub mod whisper;

pub use cosyvoice::{CosyVoiceCloner, CosyVoiceConfig};
pub use openai_chat::OpenAiCompatibleChat;
pub use talking_gaussian::{TalkingGaussianConfig, TalkingGaussianRenderer};
pub use whisper::{WhisperConfig, WhisperRecognizer};

use crate::providers::ProviderProfile;
use crate::stages::ErrorKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reported by an external engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A file the engine needs does not exist
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Network/transport failure
    #[error("Request failed: {0}")]
    Request(String),

    /// Remote service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Subprocess could not be launched or exited nonzero
    #[error("Process failed: {0}")]
    Process(String),

    /// Response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Engine reported success but produced nothing
    #[error("No output produced: {0}")]
    NoOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Stage-level classification of this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MissingInput(_) => ErrorKind::MissingInput,
            EngineError::NoOutput(_) => ErrorKind::OutputNotProduced,
            _ => ErrorKind::ExternalCallFailed,
        }
    }
}

/// Speech recognition (ASR)
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize speech in a WAV file; `locale` like `zh-CN`
    async fn recognize(&self, wav: &Path, locale: &str) -> Result<String, EngineError>;
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat completion request body (OpenAI wire format)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat completion against a resolved provider profile
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        request: &ChatRequest,
    ) -> Result<String, EngineError>;
}

/// Voice clone job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneJob {
    pub text: String,
    pub reference_audio: PathBuf,
    pub output_path: PathBuf,
    pub language: String,
}

/// Zero-shot voice cloning
#[async_trait]
pub trait VoiceCloner: Send + Sync {
    /// Path of the generated WAV, or `None` when the engine produced nothing
    async fn clone_voice(&self, job: &CloneJob) -> Result<Option<PathBuf>, EngineError>;
}

/// Talking-head render job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub model_name: String,
    pub checkpoint: String,
    pub reference_audio: PathBuf,
    pub dataset_path: String,
    pub device: String,
    pub feature_extractor: String,
    pub output_path: PathBuf,
}

/// Talking-head video rendering
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Path of the rendered video
    async fn render(&self, job: &RenderJob) -> Result<PathBuf, EngineError>;
}
