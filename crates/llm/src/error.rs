use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Methods accepted by the generation endpoint.
pub(crate) const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";

/// Errors of the generation endpoint, each with its HTTP status.
///
/// Before the streaming response is committed, any of these becomes a plain
/// JSON response. Afterwards they can only be reported inline in the stream.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The caller did not present a valid credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// The request method is not one of GET, POST or OPTIONS.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The submission could not be parsed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The submission body is larger than the configured limit.
    #[error("Request body exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The selected provider is unknown or unusable.
    #[error("Invalid LLM provider configuration: {0}")]
    Config(String),

    /// The provider rejected our credentials.
    #[error("Provider authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The provider does not know the configured model.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The provider rate limited the request.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The provider returned an error status or an error inside the stream.
    #[error("Provider API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error towards the provider.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Internal server error.
    /// If Some(message), it came from a provider and can be shown.
    /// If None, it's an internal error and should not leak details.
    #[error("Internal server error")]
    InternalError(Option<String>),
}

impl LlmError {
    /// Map a non-success status of a provider API to an error.
    pub(crate) fn from_upstream(status: u16, message: String) -> Self {
        match status {
            400 => Self::InvalidRequest(message),
            401 | 403 => Self::AuthenticationFailed(message),
            404 => Self::ModelNotFound(message),
            429 => Self::RateLimitExceeded(message),
            500 => Self::InternalError(Some(message)),
            _ => Self::ProviderApiError { status, message },
        }
    }

    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            // Our own provider credential or model is wrong, the caller can't fix that.
            Self::AuthenticationFailed(_) | Self::ModelNotFound(_) => StatusCode::BAD_GATEWAY,
            Self::ProviderApiError { .. } | Self::ConnectionError(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client, either in a JSON body or in an
    /// inline error event.
    pub(crate) fn client_message(&self) -> String {
        match self {
            Self::InternalError(Some(provider_msg)) => provider_msg.clone(),
            Self::InternalError(None) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for LlmError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            match &self {
                Self::InternalError(Some(provider_msg)) => {
                    log::error!("Provider returned internal error: {provider_msg}");
                }
                Self::InternalError(None) => {
                    log::error!("Internal server error occurred");
                }
                _ => {
                    log::error!("Server error ({}): {}", status.as_u16(), self);
                }
            }
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::MethodNotAllowed = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }

        response
    }
}
