//! Speech recognition over an OpenAI-compatible `/audio/transcriptions` endpoint

use super::{EngineError, SpeechRecognizer};
use async_trait::async_trait;
use reqwest::multipart;
use std::path::Path;
use std::time::Duration;

/// Whisper endpoint settings
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

pub struct WhisperRecognizer {
    client: reqwest::Client,
    config: WhisperConfig,
}

impl WhisperRecognizer {
    pub fn new(config: WhisperConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::Request(e.to_string()))?;

        Ok(Self { client, config })
    }
}

/// `zh-CN` → `zh`; Whisper takes ISO-639-1 codes
fn language_code(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn recognize(&self, wav: &Path, locale: &str) -> Result<String, EngineError> {
        let audio = match tokio::fs::read(wav).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::MissingInput(wav.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let url = format!("{}/audio/transcriptions", self.config.base_url.trim_end_matches('/'));

        let file_part = multipart::Part::bytes(audio)
            .file_name("input.wav")
            .mime_str("audio/wav")
            .map_err(|e| EngineError::Request(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.config.model.clone())
            .text("language", language_code(locale).to_string())
            .text("response_format", "text")
            .part("file", file_part);

        tracing::debug!(model = %self.config.model, locale, "Sending audio to speech recognition");

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
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

        let transcript = response
            .text()
            .await
            .map_err(|e| EngineError::Parse(e.to_string()))?;

        tracing::info!(chars = transcript.chars().count(), "Speech recognition completed");

        Ok(transcript.trim().to_string())
    }
}
