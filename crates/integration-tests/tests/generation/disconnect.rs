use std::time::Duration;

use integration_tests::llms::{Behavior, GeminiMock, OpenAiMock, gemini_chunk, openai_chunk};

use super::{gemini_server, openai_server, submit, visit};

const DISCONNECT_LIMIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn client_disconnect_cancels_gemini_stream() {
    let mock = GeminiMock::start(Behavior::Endless(gemini_chunk("tick"))).await;
    let (server, _jwks) = gemini_server(&mock).await;

    let mut response = submit(&server, &visit()).await;
    assert_eq!(response.status(), 200);

    let first = response.chunk().await.unwrap().unwrap();
    assert!(first.starts_with(b"data: tick\n\n"));

    drop(response);

    assert!(
        mock.wait_for_disconnect(DISCONNECT_LIMIT).await,
        "upstream stream kept running after the client left"
    );
}

#[tokio::test]
async fn client_disconnect_cancels_openai_producer() {
    let mock = OpenAiMock::start(Behavior::Endless(openai_chunk("tick"))).await;
    let (server, _jwks) = openai_server(&mock).await;

    let mut response = submit(&server, &visit()).await;
    assert_eq!(response.status(), 200);

    let first = response.chunk().await.unwrap().unwrap();
    assert!(first.starts_with(b"data: tick\n\n"));

    drop(response);

    assert!(
        mock.wait_for_disconnect(DISCONNECT_LIMIT).await,
        "upstream stream kept running after the client left"
    );
}
