//! The single generation endpoint.
//!
//! GET is a liveness probe, OPTIONS answers preflights, and POST streams a
//! generated reply to an authenticated caller's submission.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, Method, header::ALLOW},
    response::{IntoResponse, Response},
};
use config::SessionIdentity;
use serde::Serialize;

use crate::{
    error::{ALLOWED_METHODS, LlmError},
    relay::Relay,
    server::GenerationServer,
    submission::Submission,
};

#[derive(Debug, Serialize)]
struct Liveness {
    status: &'static str,
    message: &'static str,
}

pub(crate) async fn handle(State(server): State<Arc<GenerationServer>>, request: Request) -> Response {
    let method = request.method().clone();

    match method {
        Method::GET => Json(Liveness {
            status: "ok",
            message: "Use POST to stream a summary.",
        })
        .into_response(),
        Method::OPTIONS => {
            let mut response = ().into_response();
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));

            response
        }
        Method::POST => match generate(&server, request).await {
            Ok(response) => response,
            Err(error) => error.into_response(),
        },
        method => {
            log::debug!("Rejecting {method} request to the generation endpoint");
            LlmError::MethodNotAllowed.into_response()
        }
    }
}

/// Authenticate, parse, build the prompt, and relay the provider's fragments.
///
/// The body is only read once the caller is known.
async fn generate(server: &GenerationServer, request: Request) -> crate::Result<Response> {
    let (parts, body) = request.into_parts();

    let Some(identity) = parts.extensions.get::<SessionIdentity>() else {
        log::debug!("Rejecting generation request without a session identity");
        return Err(LlmError::Unauthorized);
    };

    log::info!("Generation requested by subject '{}'", identity.subject);

    let limit = server.body_limit();

    let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
        log::debug!("Failed to read submission body: {e}");
        LlmError::PayloadTooLarge { limit }
    })?;

    let submission = Submission::from_body(&body)?;

    let mut relay = Relay::new(server.generate(submission).await?);
    relay.prime().await?;

    log::debug!("Committing streaming response");

    Ok(relay.into_response())
}
