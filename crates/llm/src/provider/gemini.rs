mod input;
mod output;

use std::time::Duration;

use async_trait::async_trait;
use config::{ProviderConfig, ProviderKind};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use self::{input::GeminiGenerateRequest, output::GeminiStreamChunk};
use crate::{
    error::LlmError,
    prompt::Prompt,
    provider::{FragmentStream, Provider, token},
};

const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Google Gemini, consumed by pulling SSE events from the response body.
pub(crate) struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                log::error!("Failed to create HTTP client for Gemini provider: {e}");
                LlmError::InternalError(None)
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string());

        let model = config.model.clone().unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: token::api_key(ProviderKind::Gemini, config)?,
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, prompt: &Prompt) -> crate::Result<FragmentStream> {
        let url = format!("{}/models/{}:streamGenerateContent?alt=sse", self.base_url, self.model);
        let request = GeminiGenerateRequest::from(prompt);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(format!("Failed to send streaming request to Gemini: {e}")))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Gemini streaming API error ({status}): {error_text}");

            return Err(LlmError::from_upstream(status.as_u16(), error_text));
        }

        let event_stream = response.bytes_stream().eventsource();

        let fragments = event_stream.filter_map(|event| async move {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    log::error!("Gemini stream interrupted: {e}");
                    return Some(Err(LlmError::ConnectionError(format!("Gemini stream interrupted: {e}"))));
                }
            };

            let Ok(chunk) = sonic_rs::from_str::<GeminiStreamChunk>(&event.data) else {
                log::warn!("Failed to parse Gemini streaming chunk: {}", event.data);
                return None;
            };

            chunk.into_fragment().transpose()
        });

        Ok(Box::pin(fragments))
    }

    fn name(&self) -> &str {
        ProviderKind::Gemini.as_str()
    }
}
