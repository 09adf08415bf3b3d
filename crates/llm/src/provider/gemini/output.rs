use serde::Deserialize;

use crate::{error::LlmError, provider::Fragment};

/// One SSE data payload of a Gemini stream.
#[derive(Debug, Deserialize)]
pub(super) struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    code: Option<u16>,
    message: String,
    status: Option<String>,
}

impl GeminiStreamChunk {
    /// The text of the first candidate, or the error reported in the stream.
    ///
    /// Chunks without text, like the closing one carrying only a finish reason, yield nothing.
    pub(super) fn into_fragment(self) -> crate::Result<Option<Fragment>> {
        if let Some(error) = self.error {
            log::error!(
                "Gemini reported an error mid-stream ({}): {}",
                error.status.as_deref().unwrap_or("UNKNOWN"),
                error.message
            );

            return Err(LlmError::ProviderApiError {
                status: error.code.unwrap_or(500),
                message: error.message,
            });
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .into_iter()
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect();

        Ok((!text.is_empty()).then(|| Fragment::from(text)))
    }
}
