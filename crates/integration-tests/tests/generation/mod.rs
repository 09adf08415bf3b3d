mod disconnect;
mod gate;
mod gemini;
mod openai;

use indoc::formatdoc;
use integration_tests::{
    TestServer,
    jwks::{MockJwks, TEST_AUDIENCE, TEST_ISSUER, token_for},
    llms::{GeminiMock, OPENAI_TEST_KEY, OpenAiMock},
};
use serde_json::{Value, json};

pub(crate) const GEMINI_TEST_KEY: &str = "gemini-test-key";

/// Server configuration with authentication against the mock identity provider.
pub(crate) fn config(jwks: &MockJwks, llm: &str) -> String {
    formatdoc! {r#"
        [server.auth]
        url = "{url}"
        expected_issuer = "{issuer}"
        expected_audience = "{audience}"

        {llm}
    "#, url = jwks.url(), issuer = TEST_ISSUER, audience = TEST_AUDIENCE, llm = llm}
}

pub(crate) fn gemini_section(mock: &GeminiMock) -> String {
    formatdoc! {r#"
        [llm]
        provider = "gemini"

        [llm.providers.gemini]
        api_key = "{key}"
        base_url = "{base_url}"
    "#, key = GEMINI_TEST_KEY, base_url = mock.base_url()}
}

pub(crate) fn openai_section(mock: &OpenAiMock) -> String {
    formatdoc! {r#"
        [llm]
        provider = "openai"

        [llm.providers.openai]
        api_key = "{key}"
        base_url = "{base_url}"
    "#, key = OPENAI_TEST_KEY, base_url = mock.base_url()}
}

/// Starts the server in front of a Gemini mock.
pub(crate) async fn gemini_server(mock: &GeminiMock) -> (TestServer, MockJwks) {
    let jwks = MockJwks::start().await;
    let server = TestServer::start(&config(&jwks, &gemini_section(mock))).await;

    (server, jwks)
}

/// Starts the server in front of an OpenAI mock.
pub(crate) async fn openai_server(mock: &OpenAiMock) -> (TestServer, MockJwks) {
    let jwks = MockJwks::start().await;
    let server = TestServer::start(&config(&jwks, &openai_section(mock))).await;

    (server, jwks)
}

pub(crate) fn visit() -> Value {
    json!({
        "patient_name": "Jane Doe",
        "date_of_visit": "2024-01-01",
        "notes": "Persistent cough for two weeks."
    })
}

/// An authenticated POST of a submission to the generation endpoint.
pub(crate) async fn submit(server: &TestServer, submission: &Value) -> reqwest::Response {
    server
        .client
        .post("/api", submission)
        .bearer_auth(token_for("doctor-1"))
        .send()
        .await
        .unwrap()
}

/// Status, content type and the whole body of a response.
pub(crate) async fn read(response: reqwest::Response) -> (u16, String, String) {
    let status = response.status().as_u16();

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = response.text().await.unwrap();

    (status, content_type, body)
}
