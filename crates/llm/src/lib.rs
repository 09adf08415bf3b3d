//! The streaming generation endpoint.
//!
//! A submission is turned into a prompt, sent to the selected model provider,
//! and the generated text is relayed to the caller as server-sent events.

use std::sync::Arc;

use axum::{Router, routing::any};
use config::LlmConfig;

mod error;
mod gate;
mod prompt;
mod provider;
mod relay;
mod server;
mod submission;

pub use error::LlmError;
use server::GenerationServer;

pub(crate) type Result<T> = std::result::Result<T, LlmError>;

/// Creates an axum router serving the generation endpoint at the configured path.
///
/// Callers are expected to be authenticated by an outer layer, which puts a
/// [`config::SessionIdentity`] into the request extensions.
pub fn router(config: &LlmConfig) -> anyhow::Result<Router> {
    let server = GenerationServer::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize generation endpoint: {e}"))?;

    Ok(Router::new()
        .route(&config.path, any(gate::handle))
        .with_state(Arc::new(server)))
}
