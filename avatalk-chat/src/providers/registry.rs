//! Provider registry: three-layer configuration merge
//!
//! Precedence per backend, per field: **environment > config file > built-in default**.
//!
//! The registry is rebuilt on every call so edits to the config file or the
//! environment take effect on the next request without a restart.

use super::profile::{FieldSource, ProviderProfile};
use super::Backend;
use avatalk_common::config::EnvSource;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// File name of the persisted provider config, relative to `<root>/config`
pub const PROVIDER_CONFIG_FILE: &str = "providers.toml";

/// Checked-in example documenting the schema
pub const PROVIDER_EXAMPLE_FILE: &str = "providers.example.toml";

/// One backend table in `providers.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderFileEntry {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Parsed `providers.toml`: `[openai]`, `[zhipu]`, `[deepseek]` tables
///
/// Table names must be the lowercase backend name; other tables are accepted
/// and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ProviderFile {
    pub backends: HashMap<String, ProviderFileEntry>,
}

impl ProviderFile {
    fn entry(&self, backend: Backend) -> Option<&ProviderFileEntry> {
        self.backends.get(backend.name())
    }
}

/// Ordered mapping from backend to merged profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRegistry {
    profiles: BTreeMap<Backend, ProviderProfile>,
}

impl ProviderRegistry {
    /// Registry containing only built-in defaults
    pub fn builtin() -> Self {
        Self {
            profiles: Backend::ALL
                .into_iter()
                .map(|b| (b, ProviderProfile::builtin(b)))
                .collect(),
        }
    }

    pub fn get(&self, backend: Backend) -> Option<&ProviderProfile> {
        self.profiles.get(&backend)
    }

    /// Profiles in registry order
    pub fn profiles(&self) -> impl Iterator<Item = &ProviderProfile> {
        self.profiles.values()
    }

    /// Replace one profile (used to build fixtures)
    pub fn with_profile(mut self, profile: ProviderProfile) -> Self {
        self.profiles.insert(profile.backend, profile);
        self
    }
}

/// Anything that can produce a fresh registry per request
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> ProviderRegistry;
}

/// A fixed registry; reloading returns the same values
impl ConfigSource for ProviderRegistry {
    fn load(&self) -> ProviderRegistry {
        self.clone()
    }
}

/// Provider config backed by `providers.toml` plus an environment
#[derive(Clone)]
pub struct FileConfigSource {
    path: PathBuf,
    env: Arc<dyn EnvSource>,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>, env: Arc<dyn EnvSource>) -> Self {
        Self {
            path: path.into(),
            env,
        }
    }

    /// `<root>/config/providers.toml`
    pub fn under_root(root: &Path, env: Arc<dyn EnvSource>) -> Self {
        Self::new(root.join("config").join(PROVIDER_CONFIG_FILE), env)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> ProviderRegistry {
        load_config(&self.path, self.env.as_ref())
    }
}

/// Read `path` and merge it with `env` and the built-in defaults
///
/// Never fails: a missing file logs setup guidance, an unreadable or
/// malformed file is logged and treated as empty.
pub fn load_config(path: &Path, env: &dyn EnvSource) -> ProviderRegistry {
    let contents = if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                warn!(path = %path.display(), "Failed to read provider config: {}, using defaults", e);
                None
            }
        }
    } else {
        let example = path.with_file_name(PROVIDER_EXAMPLE_FILE);
        info!(path = %path.display(), "Provider config file not found");
        if example.exists() {
            info!(
                "Copy {} to {} and fill in your API keys",
                example.display(),
                path.display()
            );
        }
        None
    };

    merge_layers(env, contents.as_deref())
}

/// Merge environment, file contents and defaults into a registry
///
/// Pure function of its inputs.
pub fn merge_layers(env: &dyn EnvSource, file_contents: Option<&str>) -> ProviderRegistry {
    let file = match file_contents {
        Some(contents) => match toml::from_str::<ProviderFile>(contents) {
            Ok(file) => file,
            Err(e) => {
                warn!("Malformed provider config, ignoring file: {}", e);
                ProviderFile::default()
            }
        },
        None => ProviderFile::default(),
    };

    let profiles = Backend::ALL
        .into_iter()
        .map(|backend| (backend, merge_profile(backend, env, file.entry(backend))))
        .collect();

    ProviderRegistry { profiles }
}

fn merge_profile(
    backend: Backend,
    env: &dyn EnvSource,
    file: Option<&ProviderFileEntry>,
) -> ProviderProfile {
    let prefix = backend.env_prefix();
    let env_value = |field: &str| {
        env.var(&format!("{}_{}", prefix, field))
            .filter(|v| !v.trim().is_empty())
    };
    let file_value = |pick: fn(&ProviderFileEntry) -> Option<&String>| {
        file.and_then(pick)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    };

    let mut profile = ProviderProfile::builtin(backend);

    if let Some(key) = env_value("API_KEY") {
        profile.api_key = Some(key);
        profile.key_source = FieldSource::Environment;
    } else if let Some(key) = file_value(|e| e.api_key.as_ref()) {
        profile.api_key = Some(key);
        profile.key_source = FieldSource::File;
    }

    if let Some(url) = env_value("BASE_URL").or_else(|| file_value(|e| e.base_url.as_ref())) {
        profile.base_url = url;
    }

    if let Some(model) = env_value("MODEL").or_else(|| file_value(|e| e.model.as_ref())) {
        profile.model = model;
    }

    let env_enabled = env_value("ENABLED").and_then(|raw| {
        let parsed = parse_flag(&raw);
        if parsed.is_none() {
            warn!(backend = %backend, value = %raw, "Ignoring unparseable {}_ENABLED", prefix);
        }
        parsed
    });
    if let Some(enabled) = env_enabled.or_else(|| file.and_then(|e| e.enabled)) {
        profile.enabled = enabled;
    }

    profile
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
