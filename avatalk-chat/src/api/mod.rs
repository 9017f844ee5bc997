//! HTTP API handlers for avatalk-chat

pub mod chat;
pub mod health;
pub mod llm;
pub mod providers;

pub use chat::chat_routes;
pub use health::health_routes;
pub use llm::llm_routes;
pub use providers::provider_routes;
