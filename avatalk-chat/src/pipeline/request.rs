//! Per-request stage parameters

use crate::providers::PRIMARY_BACKEND;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_MODEL_PARAM: &str = "output/talking_May";
pub const DEFAULT_DATASET_PATH: &str = "data/May";
pub const DEFAULT_GPU_CHOICE: &str = "GPU0";
pub const DEFAULT_AUDIO_EXTRACTOR: &str = "deepspeech";

/// Stage parameters for one pipeline run
///
/// Unknown keys are ignored; missing keys take the documented defaults.
/// The controller only ever borrows a request, so it stays immutable for the
/// lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineRequest {
    /// Reference voice WAV; falls back to the default reference when absent
    pub voice_clone: Option<String>,
    /// Render checkpoint identifier
    pub model_param: String,
    pub dataset_path: String,
    /// Compute device selector (`GPU<n>` or `CPU`)
    pub gpu_choice: String,
    /// Render feature extractor
    pub audio_extractor: String,
    /// Requested language-model backend
    pub api_choice: String,
}

impl Default for PipelineRequest {
    fn default() -> Self {
        Self {
            voice_clone: None,
            model_param: DEFAULT_MODEL_PARAM.to_string(),
            dataset_path: DEFAULT_DATASET_PATH.to_string(),
            gpu_choice: DEFAULT_GPU_CHOICE.to_string(),
            audio_extractor: DEFAULT_AUDIO_EXTRACTOR.to_string(),
            api_choice: PRIMARY_BACKEND.name().to_string(),
        }
    }
}

impl PipelineRequest {
    /// Build a request from a loose JSON mapping
    ///
    /// Only string values are taken; a missing key or a value of any other
    /// type keeps the default, so a malformed field never rejects the run.
    pub fn from_map(map: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| match map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                warn!(key, value = %other, "Ignoring non-string request parameter");
                None
            }
            None => None,
        };

        Self {
            voice_clone: text("voice_clone"),
            model_param: text("model_param").unwrap_or(defaults.model_param),
            dataset_path: text("dataset_path").unwrap_or(defaults.dataset_path),
            gpu_choice: text("gpu_choice").unwrap_or(defaults.gpu_choice),
            audio_extractor: text("audio_extractor").unwrap_or(defaults.audio_extractor),
            api_choice: text("api_choice").unwrap_or(defaults.api_choice),
        }
    }
}
