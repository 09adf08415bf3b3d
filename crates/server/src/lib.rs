//! Consult server library.
//!
//! Provides a reusable server function to serve Consult either for the binary, or for the integration tests.

#![deny(missing_docs)]

mod auth;
mod cors;
mod health;

use std::net::SocketAddr;

use anyhow::anyhow;
use auth::AuthLayer;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use config::{Config, CorsConfig};
use tokio::net::TcpListener;

/// Configuration for serving Consult.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to
    pub listen_address: SocketAddr,
    /// The deserialized Consult TOML configuration.
    pub config: Config,
}

/// Starts and runs the Consult server with the provided configuration.
pub async fn serve(ServeConfig { listen_address, config }: ServeConfig) -> anyhow::Result<()> {
    let mut app = Router::new();

    let cors = match &config.server.cors {
        Some(cors_config) => cors::generate(cors_config),
        None => cors::generate(&CorsConfig::default()),
    };

    let provider = if config.llm.enabled() {
        let auth_config = config
            .server
            .auth
            .clone()
            .ok_or_else(|| anyhow!("The generation endpoint requires [server.auth] to be configured"))?;

        let llm_router = llm::router(&config.llm)?;

        app = app.merge(llm_router.layer(AuthLayer::new(auth_config)));

        Some(config.llm.provider)
    } else {
        log::warn!("Generation endpoint is disabled, only the health endpoint will be served");
        None
    };

    if config.server.health.enabled {
        if let Some(listen) = config.server.health.listen {
            tokio::spawn(health::bind_health_endpoint(
                listen,
                config.server.tls.clone(),
                config.server.health.clone(),
                provider,
            ));
        } else {
            app = app.merge(health::router(&config.server.health, provider));
        }
    }

    let app = app.layer(cors);

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    match &config.server.tls {
        Some(tls_config) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls_config.certificate, &tls_config.key)
                .await
                .map_err(|e| anyhow!("Failed to load TLS certificate and key: {e}"))?;

            if provider.is_some() {
                log::info!("Generation endpoint available at: https://{listen_address}{}", config.llm.path);
            }

            axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                .serve(app.into_make_service())
                .await
                .map_err(|e| anyhow!("Failed to start HTTPS server: {e}"))?;
        }
        None => {
            if provider.is_some() {
                log::info!("Generation endpoint available at: http://{listen_address}{}", config.llm.path);
            }

            axum::serve(listener, app)
                .await
                .map_err(|e| anyhow!("Failed to start HTTP server: {}", e))?;
        }
    }

    Ok(())
}
