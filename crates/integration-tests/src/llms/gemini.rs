use std::{ops::Deref, sync::Arc};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Uri},
    routing::post,
};
use serde_json::json;

use super::{Behavior, MockState, MockUpstream, record, respond};

/// A stream chunk as Gemini sends it, carrying one text part.
pub fn gemini_chunk(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "index": 0
        }]
    })
    .to_string()
}

/// Mock of the Gemini `streamGenerateContent` API.
#[derive(Clone)]
pub struct GeminiMock(MockUpstream);

impl GeminiMock {
    pub async fn start(behavior: Behavior) -> Self {
        let upstream = MockUpstream::start(behavior, |state| {
            Router::new()
                .route("/v1beta/models/{*path}", post(generate))
                .with_state(state)
        })
        .await;

        Self(upstream)
    }

    /// Streams one chunk per text, then ends.
    pub async fn with_chunks(texts: &[&str]) -> Self {
        Self::start(Behavior::Events(texts.iter().map(|text| gemini_chunk(text)).collect())).await
    }

    /// The value for `base_url` in the provider configuration.
    pub fn base_url(&self) -> String {
        self.0.url("/v1beta")
    }
}

impl Deref for GeminiMock {
    type Target = MockUpstream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

async fn generate(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    record(&state, &uri, headers, body);
    respond(state)
}
