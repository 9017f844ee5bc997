//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Missing or malformed TOML files never terminate a service; they are logged
//! and the compiled defaults are used instead.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Read-only view of process environment variables
///
/// Resolution code takes an `EnvSource` instead of calling `std::env::var`
/// directly so that tests can supply a plain map.
pub trait EnvSource: Send + Sync {
    /// Value of `key`, or `None` when unset
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform configuration file path for a module
///
/// `~/.config/avatalk/<module>.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("avatalk").join(format!("{}.toml", module_name)))
}

/// Read and parse a TOML file, reporting failures as errors
pub fn read_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
}

/// Load a TOML file, falling back to `T::default()` on any failure
///
/// A missing file is logged at info level; a file that exists but cannot be
/// read or parsed is logged as a warning.
pub fn load_toml_config<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        info!(
            "Config file not found: {}, using compiled defaults",
            path.display()
        );
        return T::default();
    }

    match read_toml_config(path) {
        Ok(config) => {
            info!("Loaded config file: {}", path.display());
            config
        }
        Err(e) => {
            warn!("{}; using compiled defaults", e);
            T::default()
        }
    }
}

/// Root folder resolver
///
/// Every artifact path a service uses is relative to the root folder.
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    env_var_name: String,
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    /// Create resolver reading the given environment variable
    pub fn new(env_var_name: impl Into<String>) -> Self {
        Self {
            env_var_name: env_var_name.into(),
            cli_arg: None,
            toml_value: None,
        }
    }

    /// Command-line value (priority 1)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// TOML value (priority 3)
    pub fn with_toml_value(mut self, path: Option<PathBuf>) -> Self {
        self.toml_value = path;
        self
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> PathBuf {
        self.resolve_with(&ProcessEnv)
    }

    /// Resolve against an explicit environment
    pub fn resolve_with(&self, env: &dyn EnvSource) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Some(path) = env.var(&self.env_var_name).filter(|v| !v.trim().is_empty()) {
            return PathBuf::from(path);
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        default_root_folder()
    }
}

/// Compiled default root folder: the working directory
fn default_root_folder() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
