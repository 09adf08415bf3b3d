//! Mock generation backends speaking just enough of each wire format.

mod gemini;
mod openai;

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use futures::stream::{self, StreamExt};
use tokio::net::TcpListener;

pub use gemini::{GeminiMock, gemini_chunk};
pub use openai::{OPENAI_TEST_KEY, OpenAiMock, openai_chunk};

/// How a mock backend answers a generation request.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Stream these SSE data payloads, then end the response.
    Events(Vec<String>),
    /// Stream these SSE data payloads, then break the connection.
    Interrupted(Vec<String>),
    /// Answer with an error status and body instead of streaming.
    Status(u16, String),
    /// Repeat a payload until the caller goes away.
    Endless(String),
}

/// A request received by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

struct MockState {
    behavior: Behavior,
    requests: Mutex<Vec<RecordedRequest>>,
    streams_dropped: AtomicUsize,
}

/// Counts a response body as dropped when it goes away.
struct DropFlag(Arc<MockState>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.streams_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shared part of both mock backends: the listener, recorded requests and
/// the scripted response.
#[derive(Clone)]
pub struct MockUpstream {
    address: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    async fn start(behavior: Behavior, router: impl FnOnce(Arc<MockState>) -> axum::Router) -> Self {
        let state = Arc::new(MockState {
            behavior,
            requests: Mutex::new(Vec::new()),
            streams_dropped: AtomicUsize::new(0),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let app = router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self { address, state }
    }

    /// Base URL of the mock, including the API version prefix.
    fn url(&self, prefix: &str) -> String {
        format!("http://{}{prefix}", self.address)
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// Waits until a response stream of the mock is dropped, which happens when
    /// the caller closes the connection. Returns false on timeout.
    pub async fn wait_for_disconnect(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;

        while tokio::time::Instant::now() < deadline {
            if self.state.streams_dropped.load(Ordering::SeqCst) > 0 {
                return true;
            }

            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        false
    }
}

fn record(state: &MockState, uri: &Uri, headers: HeaderMap, body: Bytes) {
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
}

fn frame(payload: &str) -> Result<Bytes, std::io::Error> {
    Ok(Bytes::from(format!("data: {payload}\n\n")))
}

fn respond(state: Arc<MockState>) -> Response {
    let guard = DropFlag(state.clone());

    let body = match state.behavior.clone() {
        Behavior::Status(status, body) => {
            let status = StatusCode::from_u16(status).unwrap();
            return (status, [(CONTENT_TYPE, "application/json")], body).into_response();
        }
        Behavior::Events(events) => {
            let events = events.into_iter().map(|event| frame(&event));
            Body::from_stream(stream::iter(events).map(move |item| {
                let _keep = &guard;
                item
            }))
        }
        Behavior::Interrupted(events) => {
            let events = events
                .into_iter()
                .map(|event| frame(&event))
                .chain(std::iter::once(Err(std::io::Error::other("connection reset"))));

            Body::from_stream(stream::iter(events).then(move |item| {
                let _keep = &guard;
                async move {
                    if item.is_err() {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    item
                }
            }))
        }
        Behavior::Endless(payload) => {
            let ticks = stream::unfold((guard, payload), |(guard, payload)| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let item = frame(&payload);
                Some((item, (guard, payload)))
            });

            Body::from_stream(ticks)
        }
    };

    (StatusCode::OK, [(CONTENT_TYPE, "text/event-stream")], body).into_response()
}
