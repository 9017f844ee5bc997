//! Response stage: transcript → language-model reply file
//!
//! Resolves a provider from a freshly loaded registry on every invocation.
//! An unconfigured credential is reported to the controller as an ordinary
//! `ExternalCallFailed`.

use super::{write_text_artifact, ErrorKind, StageAdapter, StageResult};
use crate::engines::ChatBackend;
use crate::providers::{reply_request, resolve, ConfigSource};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const STAGE: &str = "response";

#[derive(Debug, Clone)]
pub struct ResponseInput {
    pub transcript_path: PathBuf,
    pub reply_path: PathBuf,
    /// Requested backend name
    pub api_choice: String,
}

pub struct ResponseStage {
    providers: Arc<dyn ConfigSource>,
    chat: Arc<dyn ChatBackend>,
}

impl ResponseStage {
    pub fn new(providers: Arc<dyn ConfigSource>, chat: Arc<dyn ChatBackend>) -> Self {
        Self { providers, chat }
    }
}

#[async_trait]
impl StageAdapter for ResponseStage {
    type Input = ResponseInput;

    fn name(&self) -> &'static str {
        STAGE
    }

    fn precondition(&self, input: &ResponseInput) -> bool {
        input.transcript_path.is_file()
    }

    async fn invoke(&self, input: &ResponseInput) -> StageResult {
        let prompt = match tokio::fs::read_to_string(&input.transcript_path).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(stage = STAGE, path = %input.transcript_path.display(), "Cannot read transcript: {}", e);
                return StageResult::failure(STAGE, ErrorKind::MissingInput, e.to_string());
            }
        };

        let registry = self.providers.load();
        let resolved = match resolve(&input.api_choice, &registry) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(stage = STAGE, backend = %e.backend(), kind = %e.kind(), "{}", e);
                return StageResult::failure(STAGE, ErrorKind::ExternalCallFailed, e.to_string());
            }
        };

        info!(
            stage = STAGE,
            backend = %resolved.backend,
            model = %resolved.profile.model,
            failed_over = resolved.failed_over,
            "Requesting reply"
        );

        let request = reply_request(&resolved.profile.model, &prompt);
        let reply = match self.chat.complete(&resolved.profile, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(stage = STAGE, backend = %resolved.backend, "Chat completion failed: {}", e);
                return StageResult::failure(STAGE, e.kind(), e.to_string());
            }
        };

        if reply.trim().is_empty() {
            warn!(stage = STAGE, backend = %resolved.backend, "Empty reply");
            return StageResult::failure(STAGE, ErrorKind::OutputNotProduced, "empty reply");
        }

        if let Err(e) = write_text_artifact(&input.reply_path, &reply).await {
            warn!(stage = STAGE, path = %input.reply_path.display(), "Failed to write reply: {}", e);
            return StageResult::failure(STAGE, ErrorKind::OutputNotProduced, e.to_string());
        }

        info!(stage = STAGE, path = %input.reply_path.display(), "Reply saved");
        StageResult::success(input.reply_path.clone())
    }
}
