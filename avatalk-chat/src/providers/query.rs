//! One-shot language-model query shared by the response stage and the HTTP API

use super::registry::ConfigSource;
use super::resolver::resolve;
use crate::engines::{ChatBackend, ChatMessage, ChatRequest};
use tracing::{info, warn};

/// Persona for the digital-human assistant: short, spoken-style Chinese,
/// at most 50 characters
pub const SYSTEM_PROMPT: &str =
    "你是一个数字人助手，请用简短、口语化的中文回答用户，字数控制在50字以内。";

pub const TEMPERATURE: f32 = 0.7;

pub const MAX_TOKENS: u32 = 150;

/// Reply returned by [`query_llm`] when the backend call fails
pub const CONNECTION_APOLOGY: &str =
    "Sorry, I am having trouble reaching the language model right now. Please try again later.";

/// Chat request for a single user utterance
pub fn reply_request(model: &str, text: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(text)],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Ask the resolved backend for a reply, always returning displayable text
///
/// The registry is reloaded on every call. An unconfigured credential yields
/// the resolver's user-facing message; a failed call yields
/// [`CONNECTION_APOLOGY`].
pub async fn query_llm(
    source: &dyn ConfigSource,
    chat: &dyn ChatBackend,
    text: &str,
    api_choice: &str,
) -> String {
    info!(requested = %api_choice, "Querying language model");

    let registry = source.load();
    let resolved = match resolve(api_choice, &registry) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(backend = %e.backend(), "Language model unavailable: {}", e);
            return e.to_string();
        }
    };

    let request = reply_request(&resolved.profile.model, text);
    match chat.complete(&resolved.profile, &request).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(backend = %resolved.backend, "Language model call failed: {}", e);
            CONNECTION_APOLOGY.to_string()
        }
    }
}
