use serde::Serialize;

use crate::prompt::Prompt;

/// Request body of the Gemini `streamGenerateContent` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GeminiGenerateRequest {
    pub(super) contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
pub(super) struct GeminiContent {
    pub(super) role: &'static str,
    pub(super) parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
pub(super) struct GeminiPart {
    pub(super) text: String,
}

impl From<&Prompt> for GeminiGenerateRequest {
    fn from(prompt: &Prompt) -> Self {
        // The whole prompt goes in one user turn, preamble first.
        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt.text() }],
            }],
        }
    }
}
