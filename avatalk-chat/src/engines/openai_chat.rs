//! Chat completion over the OpenAI-compatible protocol
//!
//! OpenAI, Zhipu and DeepSeek all accept `POST {base_url}/chat/completions`
//! with bearer authentication, so one client serves every backend; the
//! resolved profile supplies the endpoint, model and key per call.

use super::{ChatBackend, ChatRequest, EngineError};
use crate::providers::ProviderProfile;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("avatalk-chat/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

pub struct OpenAiCompatibleChat {
    client: reqwest::Client,
}

impl OpenAiCompatibleChat {
    pub fn new(timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Request(e.to_string()))?;

        Ok(Self { client })
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl ChatBackend for OpenAiCompatibleChat {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        request: &ChatRequest,
    ) -> Result<String, EngineError> {
        let key = profile
            .usable_key()
            .ok_or_else(|| EngineError::Request(format!("{} has no usable API key", profile.name())))?;

        tracing::debug!(
            backend = profile.name(),
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(completions_url(&profile.base_url))
            .bearer_auth(key)
            .json(request)
            .send()
            .await
            .map_err(|e| EngineError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EngineError::Parse("response has no choices".to_string()))?;

        tracing::info!(backend = profile.name(), chars = reply.chars().count(), "Chat completion received");

        Ok(reply)
    }
}
