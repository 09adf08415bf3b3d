//! Caller authentication of the generation endpoint.
//!
//! Only POST requests are inspected. A verified caller is added to the
//! request extensions as a [`config::SessionIdentity`], anything else is
//! answered with a JSON error before the body is read.

mod claims;
mod error;
mod jwks;
mod jwt;

use std::{
    fmt::Display,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body;
use config::AuthConfig;
use error::AuthError;
use http::{
    HeaderValue, Method, Request, Response, StatusCode,
    header::{CONTENT_TYPE, WWW_AUTHENTICATE},
};
use jwt::JwtAuth;
use serde::Serialize;
use tower::Layer;

type AuthResult<T> = Result<T, AuthError>;

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl ErrorResponse {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string())
    }
}

#[derive(Clone)]
pub struct AuthLayer(Arc<AuthLayerInner>);

struct AuthLayerInner {
    jwt: JwtAuth,
}

impl AuthLayer {
    pub fn new(config: AuthConfig) -> Self {
        let jwt = JwtAuth::new(config);
        Self(Arc::new(AuthLayerInner { jwt }))
    }
}

impl<Service> Layer<Service> for AuthLayer
where
    Service: Send + Clone,
{
    type Service = AuthService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        AuthService {
            next,
            layer: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService<Service> {
    next: Service,
    layer: Arc<AuthLayerInner>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for AuthService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    Service::Error: Display + 'static,
    ReqBody: http_body::Body + Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let layer = self.layer.clone();

        if *req.method() != Method::POST {
            return Box::pin(async move { next.call(req).await });
        }

        let (mut parts, body) = req.into_parts();

        Box::pin(async move {
            match layer.jwt.authenticate(&parts).await {
                Ok(identity) => {
                    log::debug!("Authenticated subject '{}'", identity.subject);
                    parts.extensions.insert(identity);

                    next.call(Request::from_parts(parts, body)).await
                }
                Err(auth_error) => {
                    log::debug!("Rejecting request: {auth_error}");
                    Ok(rejection(auth_error))
                }
            }
        })
    }
}

fn rejection(error: AuthError) -> Response<Body> {
    let (status, body) = match error {
        AuthError::Unauthorized | AuthError::InvalidToken(_) => {
            (StatusCode::UNAUTHORIZED, ErrorResponse { error: "Unauthorized" })
        }
        AuthError::Internal => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse {
                error: "Internal server error",
            },
        ),
    };

    let mut response = Response::new(Body::from(body.to_json()));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if status == StatusCode::UNAUTHORIZED {
        headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }

    response
}
