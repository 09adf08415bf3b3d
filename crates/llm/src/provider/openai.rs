mod input;
mod output;

use std::{fmt, pin::pin, time::Duration};

use async_trait::async_trait;
use config::{ProviderConfig, ProviderKind};
use eventsource_stream::{Event, Eventsource};
use futures::{Stream, StreamExt};
use reqwest::{Client, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use self::{input::OpenAiRequest, output::OpenAiStreamChunk};
use crate::{
    error::LlmError,
    prompt::Prompt,
    provider::{
        FragmentStream, Provider,
        bridge::{FragmentSink, bridge},
        token,
    },
};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat completions.
///
/// The response is consumed by a producer task pushing each delta through a
/// bridge, the way callback based clients deliver text.
pub(crate) struct OpenAiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                log::error!("Failed to create HTTP client for OpenAI provider: {e}");
                LlmError::InternalError(None)
            })?;

        // Use custom base URL if provided, otherwise use default
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string());

        let model = config.model.clone().unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: token::api_key(ProviderKind::Openai, config)?,
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn generate(&self, prompt: &Prompt) -> crate::Result<FragmentStream> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = OpenAiRequest::new(&self.model, prompt);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(format!("Failed to send streaming request to OpenAI: {e}")))?;

        let status = response.status();

        // Check for HTTP errors before attempting to stream
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("OpenAI streaming API error ({status}): {error_text}");

            return Err(LlmError::from_upstream(status.as_u16(), error_text));
        }

        let events = response.bytes_stream().eventsource();

        Ok(bridge(move |sink| produce(events, sink)))
    }

    fn name(&self) -> &str {
        ProviderKind::Openai.as_str()
    }
}

/// Push the text of every chunk into the sink until `[DONE]`, a failure, or the consumer leaving.
async fn produce<S, E>(events: S, sink: FragmentSink)
where
    S: Stream<Item = Result<Event, E>>,
    E: fmt::Display,
{
    let mut events = pin!(events);

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                log::error!("OpenAI stream interrupted: {e}");
                sink.fail(LlmError::ConnectionError(format!("OpenAI stream interrupted: {e}")))
                    .await;

                return;
            }
        };

        if event.data == "[DONE]" {
            return;
        }

        let Ok(chunk) = sonic_rs::from_str::<OpenAiStreamChunk>(&event.data) else {
            log::warn!("Failed to parse OpenAI streaming chunk: {}", event.data);
            continue;
        };

        match chunk.into_fragment() {
            Ok(Some(fragment)) => {
                if !sink.emit(fragment).await {
                    log::debug!("OpenAI stream consumer is gone, stopping");
                    return;
                }
            }
            Ok(None) => (),
            Err(error) => {
                sink.fail(error).await;
                return;
            }
        }
    }

    // A clean close without `[DONE]` means the reply was cut short upstream.
    log::error!("OpenAI stream ended before [DONE]");
    sink.fail(LlmError::ConnectionError("OpenAI stream ended before [DONE]".to_string()))
        .await;
}
