use std::net::SocketAddr;

use anyhow::anyhow;
use axum::{Json, Router, routing::get};
use config::{HealthConfig, ProviderKind, TlsServerConfig};
use http::StatusCode;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum HealthState {
    /// Indicates that the server is healthy and operational.
    Healthy,
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct HealthReport {
    status: HealthState,
    /// The selected generation backend, if the endpoint is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'static str>,
}

/// The health route, reporting the selected provider.
pub(crate) fn router(config: &HealthConfig, provider: Option<ProviderKind>) -> Router {
    let report = HealthReport {
        status: HealthState::Healthy,
        provider: provider.map(|kind| kind.as_str()),
    };

    Router::new().route(&config.path, get(move || health(report.clone())))
}

async fn health(report: HealthReport) -> (StatusCode, Json<HealthReport>) {
    (StatusCode::OK, Json(report))
}

/// Binds the health check endpoint to its own address.
pub(super) async fn bind_health_endpoint(
    addr: SocketAddr,
    tls_config: Option<TlsServerConfig>,
    health_config: HealthConfig,
    provider: Option<ProviderKind>,
) -> anyhow::Result<()> {
    let scheme = if tls_config.is_some() { "https" } else { "http" };
    let app = router(&health_config, provider).into_make_service();

    log::info!("Health check endpoint exposed at {scheme}://{addr}{}", health_config.path);

    match tls_config {
        Some(tls) => {
            let rustls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.certificate, &tls.key)
                .await
                .map_err(|e| anyhow!("Failed to load TLS certificate and key: {}", e))?;

            axum_server::bind_rustls(addr, rustls_config)
                .serve(app)
                .await
                .map_err(|e| anyhow!("Failed to start HTTP server in the health endpoint: {e}"))?;
        }
        None => axum_server::bind(addr)
            .serve(app)
            .await
            .map_err(|e| anyhow!("Failed to start HTTP server in the health endpoint: {e}"))?,
    }

    Ok(())
}
