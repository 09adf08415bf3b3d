//! Consult configuration structures to map the consult.toml configuration.

#![deny(missing_docs)]

mod auth;
mod cors;
mod health;
mod identity;
mod llm;
mod loader;
mod server;
mod tls;

use std::path::Path;

pub use auth::AuthConfig;
pub use cors::{AllowedOrigins, CorsConfig};
pub use health::HealthConfig;
pub use identity::SessionIdentity;
pub use llm::{LlmConfig, PromptPreset, ProviderConfig, ProviderKind, ProvidersConfig};
pub use server::ServerConfig;
pub use tls::TlsServerConfig;

use serde::Deserialize;

/// Main configuration structure for the Consult application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Generation endpoint configuration settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from a file path, expanding environment references
    /// and validating the result.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates that the selected provider is usable and that callers can be
    /// authenticated.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}
