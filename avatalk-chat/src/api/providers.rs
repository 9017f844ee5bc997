//! Provider configuration diagnostics

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::providers::{mask_key, FieldSource, ProviderProfile};
use crate::AppState;

/// One backend as seen by the resolver; the key is never returned in full
#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub enabled: bool,
    /// Usable (non-blank, non-placeholder) key present
    pub configured: bool,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_key: Option<String>,
    pub key_source: FieldSource,
}

impl From<&ProviderProfile> for ProviderStatus {
    fn from(profile: &ProviderProfile) -> Self {
        Self {
            name: profile.name().to_string(),
            enabled: profile.enabled,
            configured: profile.has_usable_key(),
            base_url: profile.base_url.clone(),
            model: profile.model.clone(),
            masked_key: profile.usable_key().map(mask_key),
            key_source: profile.key_source,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderStatus>,
}

/// GET /providers
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let registry = state.providers.load();
    Json(ProvidersResponse {
        providers: registry.profiles().map(ProviderStatus::from).collect(),
    })
}

/// Build provider routes
pub fn provider_routes() -> Router<AppState> {
    Router::new().route("/providers", get(list_providers))
}
