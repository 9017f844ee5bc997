//! Language-model provider configuration and selection
//!
//! - [`registry`]: merges environment, `providers.toml` and built-in defaults
//! - [`resolver`]: picks a usable backend with failover
//! - [`query`]: one-shot reply helper built on both

pub mod backend;
pub mod profile;
pub mod query;
pub mod registry;
pub mod resolver;

pub use backend::{Backend, FAILOVER_ORDER, PRIMARY_BACKEND};
pub use profile::{is_usable_key, mask_key, FieldSource, ProviderProfile, PLACEHOLDER_KEYS};
pub use query::{query_llm, reply_request, CONNECTION_APOLOGY};
pub use registry::{
    load_config, merge_layers, ConfigSource, FileConfigSource, ProviderRegistry,
    PROVIDER_CONFIG_FILE,
};
pub use resolver::{resolve, ResolveError, ResolvedProvider};
