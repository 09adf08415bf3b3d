use integration_tests::{
    TestServer,
    jwks::MockJwks,
    llms::{Behavior, OPENAI_TEST_KEY, OpenAiMock, openai_chunk},
};
use insta::assert_snapshot;
use serde_json::json;

use super::{config, openai_section, openai_server, read, submit, visit};

#[tokio::test]
async fn streams_deltas_as_line_events() {
    let mock = OpenAiMock::with_deltas(&["Hi", " there\nBye", "\r\nSee you"]).await;
    let (server, _jwks) = openai_server(&mock).await;

    let (status, content_type, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 200);
    assert_eq!(content_type, "text/event-stream");
    assert_eq!(body, "data: Hi\n\ndata:  there\n\ndata: Bye\n\ndata: \n\ndata: See you\n\n");
}

#[tokio::test]
async fn sends_preamble_as_system_message() {
    let mock = OpenAiMock::with_deltas(&["ok"]).await;
    let (server, _jwks) = openai_server(&mock).await;

    read(submit(&server, &visit()).await).await;

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.path, "/v1/chat/completions");
    assert_eq!(request.headers["authorization"], format!("Bearer {OPENAI_TEST_KEY}"));
    assert_eq!(request.body["model"], "gpt-4o-mini");
    assert_eq!(request.body["stream"], true);
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(request.body["messages"][1]["role"], "user");

    let system = request.body["messages"][0]["content"].as_str().unwrap();
    assert!(system.ends_with("### Draft of email to patient in patient-friendly language"), "{system}");

    assert_eq!(
        request.body["messages"][1]["content"],
        "Patient Name: Jane Doe\nDate of Visit: 2024-01-01\nNotes:\nPersistent cough for two weeks."
    );
}

#[tokio::test]
async fn stream_closed_before_done_ends_with_an_error_event() {
    let events = vec![openai_chunk("first"), openai_chunk("second")];
    let mock = OpenAiMock::start(Behavior::Events(events)).await;
    let (server, _jwks) = openai_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        "data: first\n\ndata: second\n\ndata: Error: Connection error: OpenAI stream ended before [DONE]\n\n"
    );
}

#[tokio::test]
async fn events_after_done_are_not_relayed() {
    let events = vec![openai_chunk("kept"), "[DONE]".to_string(), openai_chunk("ignored")];
    let mock = OpenAiMock::start(Behavior::Events(events)).await;
    let (server, _jwks) = openai_server(&mock).await;

    let (_, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(body, "data: kept\n\n");
}

#[tokio::test]
async fn rejected_api_key_is_a_gateway_error() {
    let mock = OpenAiMock::with_deltas(&["never sent"]).await;
    let jwks = MockJwks::start().await;

    let llm = openai_section(&mock).replace(OPENAI_TEST_KEY, "sk-wrong-key");
    let server = TestServer::start(&config(&jwks, &llm)).await;

    let (status, content_type, body) = read(submit(&server, &visit()).await).await;
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, 502);
    assert_eq!(content_type, "application/json");
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Provider authentication failed: "),
        "{body}"
    );
}

#[tokio::test]
async fn bad_request_upstream_is_a_bad_request() {
    let mock = OpenAiMock::start(Behavior::Status(400, "context_length_exceeded".to_string())).await;
    let (server, _jwks) = openai_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 400);
    assert_snapshot!(body, @r#"{"error":"Invalid request: context_length_exceeded"}"#);
}

#[tokio::test]
async fn unexpected_upstream_status_is_a_gateway_error() {
    let mock = OpenAiMock::start(Behavior::Status(503, "upstream unavailable".to_string())).await;
    let (server, _jwks) = openai_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 502);
    assert_snapshot!(body, @r#"{"error":"Provider API error (503): upstream unavailable"}"#);
}

#[tokio::test]
async fn error_chunk_after_first_delta_is_an_inline_event() {
    let error = json!({ "error": { "message": "The server had an error", "type": "server_error" } }).to_string();
    let mock = OpenAiMock::start(Behavior::Events(vec![openai_chunk("Partial"), error])).await;
    let (server, _jwks) = openai_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        "data: Partial\n\ndata: Error: Provider API error (500): The server had an error\n\n"
    );
}

#[tokio::test]
async fn broken_upstream_connection_ends_with_an_error_event() {
    let mock = OpenAiMock::start(Behavior::Interrupted(vec![openai_chunk("Partial")])).await;
    let (server, _jwks) = openai_server(&mock).await;

    let (status, _, body) = read(submit(&server, &visit()).await).await;

    assert_eq!(status, 200);
    assert!(body.starts_with("data: Partial\n\n"), "{body:?}");

    let last = body.trim_end_matches("\n\n").rsplit("\n\n").next().unwrap();
    assert!(
        last.starts_with("data: Error: Connection error: OpenAI stream interrupted"),
        "{body:?}"
    );
}
