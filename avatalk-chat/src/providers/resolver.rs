//! Backend selection with failover
//!
//! **Algorithm:**
//! 1. Look up the requested backend; unknown names fall back to [`PRIMARY_BACKEND`]
//! 2. If that profile is disabled, adopt the first other backend in
//!    [`FAILOVER_ORDER`] that is enabled and has a usable key
//! 3. The final profile must be enabled with a usable key, otherwise
//!    resolution yields [`ResolveError::UnconfiguredCredential`]

use super::profile::ProviderProfile;
use super::registry::{ProviderRegistry, PROVIDER_CONFIG_FILE};
use super::{Backend, FAILOVER_ORDER, PRIMARY_BACKEND};
use crate::stages::ErrorKind;
use thiserror::Error;
use tracing::{info, warn};

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    /// Backend actually used (may differ from the request)
    pub backend: Backend,
    pub profile: ProviderProfile,
    /// True when a disabled backend was replaced by failover
    pub failed_over: bool,
}

/// Resolution failure
///
/// Missing credentials are an expected condition; the message is meant for
/// end users.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{message}")]
    UnconfiguredCredential { backend: Backend, message: String },
}

impl ResolveError {
    pub fn backend(&self) -> Backend {
        match self {
            ResolveError::UnconfiguredCredential { backend, .. } => *backend,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::UnconfiguredCredential
    }

    fn unconfigured(backend: Backend) -> Self {
        ResolveError::UnconfiguredCredential {
            backend,
            message: format!(
                "Sorry, no API key is configured for {}. Check config/{} or set {}.",
                backend,
                PROVIDER_CONFIG_FILE,
                backend.api_key_var()
            ),
        }
    }
}

/// Pick a working profile for `requested` from `registry`
pub fn resolve(requested: &str, registry: &ProviderRegistry) -> Result<ResolvedProvider, ResolveError> {
    let requested_backend = match Backend::from_name(requested) {
        Some(backend) if registry.get(backend).is_some() => backend,
        _ => {
            warn!(
                requested = %requested,
                "Unknown backend, falling back to {}",
                PRIMARY_BACKEND
            );
            PRIMARY_BACKEND
        }
    };

    let mut chosen = requested_backend;
    let requested_profile = registry.get(requested_backend);

    if requested_profile.map_or(true, |p| !p.enabled) {
        info!(backend = %requested_backend, "Backend disabled, trying failover");
        let fallback = FAILOVER_ORDER
            .into_iter()
            .filter(|b| *b != requested_backend)
            .find(|b| registry.get(*b).map_or(false, ProviderProfile::is_ready));

        if let Some(backend) = fallback {
            info!(from = %requested_backend, to = %backend, "Switched backend");
            chosen = backend;
        }
    }

    match registry.get(chosen) {
        Some(profile) if profile.is_ready() => Ok(ResolvedProvider {
            backend: chosen,
            profile: profile.clone(),
            failed_over: chosen != requested_backend,
        }),
        Some(profile) if !profile.enabled => {
            warn!(backend = %chosen, "No enabled backend with a configured key");
            Err(ResolveError::unconfigured(chosen))
        }
        _ => {
            warn!(backend = %chosen, "API key missing or still a placeholder");
            Err(ResolveError::unconfigured(chosen))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(backend: Backend) -> ProviderProfile {
        ProviderProfile {
            api_key: Some(format!("{}-secret", backend)),
            ..ProviderProfile::builtin(backend)
        }
    }

    fn disabled(backend: Backend) -> ProviderProfile {
        ProviderProfile {
            enabled: false,
            ..ready(backend)
        }
    }

    #[test]
    fn test_requested_backend_used_when_ready() {
        let registry = ProviderRegistry::builtin().with_profile(ready(Backend::OpenAi));
        let resolved = resolve("openai", &registry).unwrap();

        assert_eq!(resolved.backend, Backend::OpenAi);
        assert!(!resolved.failed_over);
    }

    #[test]
    fn test_unknown_backend_falls_back_to_primary() {
        let registry = ProviderRegistry::builtin().with_profile(ready(Backend::Zhipu));
        let resolved = resolve("no-such-backend", &registry).unwrap();

        assert_eq!(resolved.backend, Backend::Zhipu);
        assert!(!resolved.failed_over);
    }

    #[test]
    fn test_enabled_placeholder_does_not_fail_over() {
        let registry = ProviderRegistry::builtin()
            .with_profile(ProviderProfile {
                api_key: Some("sk-xxxxxxxx".to_string()),
                ..ProviderProfile::builtin(Backend::OpenAi)
            })
            .with_profile(ready(Backend::DeepSeek));

        let err = resolve("openai", &registry).unwrap_err();
        assert_eq!(err.backend(), Backend::OpenAi);
    }

    #[test]
    fn test_failover_skips_placeholder_keys() {
        let registry = ProviderRegistry::builtin()
            .with_profile(disabled(Backend::Zhipu))
            .with_profile(ProviderProfile {
                api_key: Some("sk-your-deepseek-api-key-here".to_string()),
                ..ProviderProfile::builtin(Backend::DeepSeek)
            })
            .with_profile(ready(Backend::OpenAi));

        let resolved = resolve("zhipu", &registry).unwrap();
        assert_eq!(resolved.backend, Backend::OpenAi);
        assert!(resolved.failed_over);
    }

    #[test]
    fn test_disabled_without_alternative_is_unconfigured() {
        let registry = ProviderRegistry::builtin()
            .with_profile(disabled(Backend::Zhipu))
            .with_profile(disabled(Backend::OpenAi))
            .with_profile(disabled(Backend::DeepSeek));

        let err = resolve("zhipu", &registry).unwrap_err();
        assert_eq!(err.backend(), Backend::Zhipu);
        assert_eq!(err.kind(), ErrorKind::UnconfiguredCredential);
        assert!(err.to_string().contains("ZHIPU_API_KEY"));
    }
}
