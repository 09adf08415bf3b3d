use std::{ops::Deref, sync::Arc};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use super::{Behavior, MockState, MockUpstream, record, respond};

/// API key the mock accepts.
pub const OPENAI_TEST_KEY: &str = "sk-test-key";

/// A chat completions stream chunk carrying one content delta.
pub fn openai_chunk(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "model": "gpt-4o-mini",
        "choices": [{ "index": 0, "delta": { "content": content }, "finish_reason": null }]
    })
    .to_string()
}

/// Mock of the OpenAI chat completions API.
#[derive(Clone)]
pub struct OpenAiMock(MockUpstream);

impl OpenAiMock {
    pub async fn start(behavior: Behavior) -> Self {
        let upstream = MockUpstream::start(behavior, |state| {
            Router::new()
                .route("/v1/chat/completions", post(chat_completions))
                .with_state(state)
        })
        .await;

        Self(upstream)
    }

    /// Streams one delta per content, then the `[DONE]` sentinel.
    pub async fn with_deltas(contents: &[&str]) -> Self {
        let events = contents
            .iter()
            .map(|content| openai_chunk(content))
            .chain(std::iter::once("[DONE]".to_string()))
            .collect();

        Self::start(Behavior::Events(events)).await
    }

    /// The value for `base_url` in the provider configuration.
    pub fn base_url(&self) -> String {
        self.0.url("/v1")
    }
}

impl Deref for OpenAiMock {
    type Target = MockUpstream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

async fn chat_completions(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {OPENAI_TEST_KEY}"));

    record(&state, &uri, headers, body);

    if !authorized {
        let body = json!({ "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" } });
        return (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
    }

    respond(state)
}
