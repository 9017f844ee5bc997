//! Bootstrap configuration for avatalk-chat
//!
//! Read from `~/.config/avatalk/chat.toml` (or `--config`). Every field has a
//! compiled default, so an absent file yields a working local setup.
//!
//! Language-model credentials live separately in `<root>/config/providers.toml`
//! and are reloaded per request; see [`crate::providers`].

use crate::engines::{
    CosyVoiceCloner, CosyVoiceConfig, EngineError, OpenAiCompatibleChat, TalkingGaussianConfig,
    TalkingGaussianRenderer, WhisperConfig, WhisperRecognizer,
};
use crate::pipeline::{Engines, PipelinePaths};
use crate::providers::ConfigSource;
use avatalk_common::config::{EnvSource, LoggingConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const MODULE_NAME: &str = "chat";
pub const ROOT_FOLDER_ENV: &str = "AVATALK_ROOT_FOLDER";
pub const DEFAULT_PORT: u16 = 5730;

/// Top-level bootstrap file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: u16,
    pub logging: LoggingConfig,
    pub engines: EnginesConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: DEFAULT_PORT,
            logging: LoggingConfig::default(),
            engines: EnginesConfig::default(),
        }
    }
}

/// External engine settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnginesConfig {
    /// Python interpreter for subprocess engines
    pub python: String,
    /// Timeout for HTTP engines (ASR, chat completion)
    pub http_timeout_secs: u64,
    pub asr: AsrConfig,
    pub cosyvoice: CosyVoiceSection,
    pub render: RenderSection,
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            http_timeout_secs: 60,
            asr: AsrConfig::default(),
            cosyvoice: CosyVoiceSection::default(),
            render: RenderSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AsrConfig {
    /// OpenAI-compatible endpoint serving `/audio/transcriptions`
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the ASR bearer token
    pub api_key_env: String,
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CosyVoiceSection {
    pub model_dir: PathBuf,
    /// Candidate scripts, first existing wins
    pub scripts: Vec<PathBuf>,
    pub fallback_result_dir: PathBuf,
    /// Reference voice used when a request names none or a missing one
    pub default_reference: PathBuf,
}

impl Default for CosyVoiceSection {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("voice_clone/CosyVoice-main/pretrained_models/CosyVoice2-0.5B"),
            scripts: vec![
                PathBuf::from("TalkingGaussian/test_cosyvoice.py"),
                PathBuf::from("voice_clone/test_cosyvoice.py"),
            ],
            fallback_result_dir: PathBuf::from("TalkingGaussian/test_result"),
            default_reference: PathBuf::from(PipelinePaths::DEFAULT_REFERENCE),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSection {
    pub script: PathBuf,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            script: PathBuf::from("TalkingGaussian/synthesize_fuse.py"),
        }
    }
}

impl TomlConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.engines.http_timeout_secs.max(1))
    }

    /// Artifact layout under `root`
    pub fn pipeline_paths(&self, root: &Path) -> PipelinePaths {
        PipelinePaths::new(root).with_default_reference(&self.engines.cosyvoice.default_reference)
    }

    /// Production engines for `root`
    pub fn build_engines(
        &self,
        root: &Path,
        env: &dyn EnvSource,
        providers: Arc<dyn ConfigSource>,
    ) -> Result<Engines, EngineError> {
        let timeout = self.http_timeout();
        let asr = &self.engines.asr;

        let recognizer = WhisperRecognizer::new(WhisperConfig {
            base_url: asr.base_url.clone(),
            model: asr.model.clone(),
            api_key: env.var(&asr.api_key_env).filter(|k| !k.trim().is_empty()),
            timeout,
        })?;

        let cosyvoice = &self.engines.cosyvoice;
        let cloner = CosyVoiceCloner::new(CosyVoiceConfig {
            root: root.to_path_buf(),
            python: self.engines.python.clone(),
            model_dir: cosyvoice.model_dir.clone(),
            scripts: cosyvoice.scripts.clone(),
            fallback_result_dir: cosyvoice.fallback_result_dir.clone(),
        });

        let renderer = TalkingGaussianRenderer::new(TalkingGaussianConfig {
            root: root.to_path_buf(),
            python: self.engines.python.clone(),
            script: self.engines.render.script.clone(),
        });

        Ok(Engines {
            recognizer: Arc::new(recognizer),
            providers,
            chat: Arc::new(OpenAiCompatibleChat::new(timeout)?),
            cloner: Arc::new(cloner),
            renderer: Arc::new(renderer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.port, 5730);
        assert_eq!(config.engines.cosyvoice.scripts.len(), 2);
    }

    #[test]
    fn test_partial_engine_section() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 8080

            [engines]
            python = "/opt/conda/bin/python"

            [engines.render]
            script = "render/run.py"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.engines.python, "/opt/conda/bin/python");
        assert_eq!(config.engines.render.script, PathBuf::from("render/run.py"));
        assert_eq!(config.engines.asr, AsrConfig::default());
    }

    #[test]
    fn test_http_timeout_never_zero() {
        let mut config = TomlConfig::default();
        config.engines.http_timeout_secs = 0;
        assert_eq!(config.http_timeout(), Duration::from_secs(1));
    }
}
