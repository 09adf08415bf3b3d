use serde::Deserialize;

use crate::{error::LlmError, provider::Fragment};

/// One SSE data payload of a chat completions stream.
#[derive(Debug, Deserialize)]
pub(super) struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    error: Option<OpenAiError>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    delta: Option<OpenAiDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl OpenAiStreamChunk {
    /// The delta text of the first choice, or the error reported in the stream.
    pub(super) fn into_fragment(self) -> crate::Result<Option<Fragment>> {
        if let Some(error) = self.error {
            log::error!(
                "OpenAI reported an error mid-stream ({}): {}",
                error.kind.as_deref().unwrap_or("unknown"),
                error.message
            );

            return Err(LlmError::ProviderApiError {
                status: 500,
                message: error.message,
            });
        }

        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .filter(|content| !content.is_empty());

        Ok(content.map(Fragment::from))
    }
}
