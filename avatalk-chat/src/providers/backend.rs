//! Well-known language-model backends

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported chat-completion backends
///
/// All three speak the OpenAI-compatible `/chat/completions` protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenAi,
    Zhipu,
    DeepSeek,
}

/// Backend used when the requested name is unknown
pub const PRIMARY_BACKEND: Backend = Backend::Zhipu;

/// Order in which a disabled backend fails over to the others
pub const FAILOVER_ORDER: [Backend; 3] = [Backend::DeepSeek, Backend::OpenAi, Backend::Zhipu];

impl Backend {
    /// Registry order (also the order of config file tables)
    pub const ALL: [Backend; 3] = [Backend::OpenAi, Backend::Zhipu, Backend::DeepSeek];

    /// Lowercase name used in config files and requests
    pub fn name(&self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Zhipu => "zhipu",
            Backend::DeepSeek => "deepseek",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
    }

    /// Prefix of this backend's environment variables (`ZHIPU`, ...)
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Backend::OpenAi => "OPENAI",
            Backend::Zhipu => "ZHIPU",
            Backend::DeepSeek => "DEEPSEEK",
        }
    }

    /// `<BACKEND>_API_KEY`
    pub fn api_key_var(&self) -> String {
        format!("{}_API_KEY", self.env_prefix())
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Backend::OpenAi => "https://api.openai.com/v1",
            Backend::Zhipu => "https://open.bigmodel.cn/api/paas/v4/",
            Backend::DeepSeek => "https://api.deepseek.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::OpenAi => "gpt-3.5-turbo",
            Backend::Zhipu => "glm-4",
            Backend::DeepSeek => "deepseek-chat",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
