//! Provider profiles and credential checks

use super::Backend;
use serde::Serialize;

/// Values shipped in example configs that mean "no key configured"
///
/// Compared exactly; anything else non-blank is treated as a real secret.
pub const PLACEHOLDER_KEYS: [&str; 3] = [
    "sk-xxxxxxxx",
    "your-zhipu-api-key-here",
    "sk-your-deepseek-api-key-here",
];

/// Where a profile field's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    Environment,
    File,
    Default,
}

/// Fully merged configuration for one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub backend: Backend,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub enabled: bool,
    /// Layer the api key was taken from (`Default` when absent)
    pub key_source: FieldSource,
}

impl ProviderProfile {
    /// Built-in default profile: enabled, no key
    pub fn builtin(backend: Backend) -> Self {
        Self {
            backend,
            api_key: None,
            base_url: backend.default_base_url().to_string(),
            model: backend.default_model().to_string(),
            enabled: true,
            key_source: FieldSource::Default,
        }
    }

    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// Key that can actually be sent to the backend
    pub fn usable_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| is_usable_key(k))
    }

    pub fn has_usable_key(&self) -> bool {
        self.usable_key().is_some()
    }

    /// Enabled and carrying a usable key
    pub fn is_ready(&self) -> bool {
        self.enabled && self.has_usable_key()
    }
}

/// Whether `key` is a real credential (non-blank, not a placeholder)
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !is_placeholder_key(key)
}

pub fn is_placeholder_key(key: &str) -> bool {
    PLACEHOLDER_KEYS.contains(&key)
}

/// Mask a secret for logs and diagnostics: `sk-a…wxyz`
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
