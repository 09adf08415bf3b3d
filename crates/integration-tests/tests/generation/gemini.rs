use integration_tests::{
    TestServer,
    jwks::MockJwks,
    llms::{Behavior, GeminiMock, gemini_chunk},
};
use insta::assert_snapshot;
use reqwest::header;
use serde_json::json;

use super::{GEMINI_TEST_KEY, config, gemini_section, gemini_server, read, submit, visit};

const OVERLOADED: &str = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;

#[tokio::test]
async fn streams_fragments_as_line_events() {
    let mock = GeminiMock::with_chunks(&["### Summary\nThe patient", " reports a cough.\n\n### Next", " steps"]).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let response = submit(&server, &visit()).await;
    let headers = response.headers().clone();
    let (status, content_type, body) = read(response).await;

    assert_eq!(status, 200);
    assert_eq!(content_type, "text/event-stream");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers["x-accel-buffering"], "no");

    assert_eq!(
        body,
        "data: ### Summary\n\ndata: The patient\n\ndata:  reports a cough.\n\ndata: \n\ndata: ### Next\n\ndata:  steps\n\n"
    );
}

#[tokio::test]
async fn sends_the_prompt_to_the_configured_model() {
    let mock = GeminiMock::with_chunks(&["ok"]).await;
    let jwks = MockJwks::start().await;

    let llm = format!("{}model = \"gemini-2.0-pro\"\n", gemini_section(&mock));
    let server = TestServer::start(&config(&jwks, &llm)).await;

    let response = submit(&server, &visit()).await;
    assert_eq!(response.status(), 200);
    response.text().await.unwrap();

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.path, "/v1beta/models/gemini-2.0-pro:streamGenerateContent");
    assert_eq!(request.query.as_deref(), Some("alt=sse"));
    assert_eq!(request.headers["x-goog-api-key"], GEMINI_TEST_KEY);
    assert_eq!(request.body["contents"][0]["role"], "user");

    let text = request.body["contents"][0]["parts"][0]["text"].as_str().unwrap();

    assert!(text.starts_with("You are provided with notes written by a doctor"), "{text}");
    assert!(
        text.ends_with("Patient Name: Jane Doe\nDate of Visit: 2024-01-01\nNotes:\nPersistent cough for two weeks."),
        "{text}"
    );
}

#[tokio::test]
async fn deployment_preset_renders_its_own_labels() {
    let mock = GeminiMock::with_chunks(&["ok"]).await;
    let jwks = MockJwks::start().await;

    let llm = gemini_section(&mock).replace("provider = \"gemini\"\n", "provider = \"gemini\"\npreset = \"deployment\"\n");
    let server = TestServer::start(&config(&jwks, &llm)).await;

    let submission = json!({
        "service": "checkout",
        "deployment_date": "2024-03-05",
        "logs": "OOMKilled"
    });

    let response = submit(&server, &submission).await;
    response.text().await.unwrap();

    let requests = mock.requests();
    let text = requests[0].body["contents"][0]["parts"][0]["text"].as_str().unwrap();

    assert!(text.starts_with("You are an expert DevOps and Cloud Infrastructure analyst."), "{text}");
    assert!(text.contains("### Deployment Analysis Summary"), "{text}");
    assert!(
        text.ends_with("Service: checkout\nDeployment Date: 2024-03-05\nLogs:\nOOMKilled"),
        "{text}"
    );
}

#[tokio::test]
async fn empty_body_builds_an_empty_submission() {
    let mock = GeminiMock::with_chunks(&["ok"]).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let response = server
        .client
        .request(reqwest::Method::POST, "/api")
        .bearer_auth(integration_tests::jwks::token_for("doctor-1"))
        .send()
        .await
        .unwrap();

    let (status, _, body) = read(response).await;

    assert_eq!(status, 200);
    assert_eq!(body, "data: ok\n\n");

    let requests = mock.requests();
    let text = requests[0].body["contents"][0]["parts"][0]["text"].as_str().unwrap();

    assert!(text.ends_with("Patient Name: \nDate of Visit: \nNotes:\n"), "{text:?}");
}

#[tokio::test]
async fn same_submission_streams_the_same_events() {
    let mock = GeminiMock::with_chunks(&["one\ntwo", "\nthree"]).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (_, _, first) = read(submit(&server, &visit()).await).await;
    let (_, _, second) = read(submit(&server, &visit()).await).await;

    assert_eq!(first, "data: one\n\ndata: two\n\ndata: \n\ndata: three\n\n");
    assert_eq!(first, second);
    assert_eq!(mock.requests()[0].body, mock.requests()[1].body);
}

#[tokio::test]
async fn rate_limited_upstream_is_a_json_error() {
    let upstream_body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
    let mock = GeminiMock::start(Behavior::Status(429, upstream_body.to_string())).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (status, content_type, body) = read(submit(&server, &visit()).await).await;
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, 429);
    assert_eq!(content_type, "application/json");
    assert_eq!(body["error"], format!("Rate limit exceeded: {upstream_body}"));
}

#[tokio::test]
async fn unknown_model_is_a_gateway_error() {
    let mock = GeminiMock::start(Behavior::Status(404, "models/nope is not found".to_string())).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (status, content_type, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 502);
    assert_eq!(content_type, "application/json");
    assert_snapshot!(body, @r#"{"error":"Model not found: models/nope is not found"}"#);
}

#[tokio::test]
async fn upstream_internal_error_keeps_its_message() {
    let mock = GeminiMock::start(Behavior::Status(500, "backend exploded".to_string())).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 500);
    assert_snapshot!(body, @r#"{"error":"backend exploded"}"#);
}

#[tokio::test]
async fn error_before_first_fragment_is_a_json_error() {
    let mock = GeminiMock::start(Behavior::Events(vec![OVERLOADED.to_string()])).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (status, content_type, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 502);
    assert_eq!(content_type, "application/json");
    assert_snapshot!(body, @r#"{"error":"Provider API error (503): The model is overloaded."}"#);
}

#[tokio::test]
async fn error_after_first_fragment_is_an_inline_event() {
    let events = vec![gemini_chunk("Partial summary\nso far"), OVERLOADED.to_string()];
    let mock = GeminiMock::start(Behavior::Events(events)).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (status, content_type, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 200);
    assert_eq!(content_type, "text/event-stream");

    assert_eq!(
        body,
        "data: Partial summary\n\ndata: so far\n\ndata: Error: Provider API error (503): The model is overloaded.\n\n"
    );
}

#[tokio::test]
async fn broken_upstream_connection_ends_with_an_error_event() {
    let mock = GeminiMock::start(Behavior::Interrupted(vec![gemini_chunk("Partial")])).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 200);
    assert!(body.starts_with("data: Partial\n\n"), "{body:?}");

    let last = body.trim_end_matches("\n\n").rsplit("\n\n").next().unwrap();
    assert!(
        last.starts_with("data: Error: Connection error: Gemini stream interrupted"),
        "{body:?}"
    );
    assert!(body.ends_with("\n\n"));
}

#[tokio::test]
async fn skips_unparseable_chunks() {
    let events = vec![
        gemini_chunk("before"),
        "this is not json".to_string(),
        json!({ "candidates": [{ "finishReason": "STOP" }] }).to_string(),
        gemini_chunk("after"),
    ];

    let mock = GeminiMock::start(Behavior::Events(events)).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 200);
    assert_eq!(body, "data: before\n\ndata: after\n\n");
}
