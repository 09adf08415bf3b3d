use serde::Serialize;

use crate::prompt::Prompt;

/// Request body for the `/v1/chat/completions` endpoint, always streaming.
#[derive(Debug, Serialize)]
pub(super) struct OpenAiRequest<'a> {
    pub(super) model: &'a str,
    pub(super) messages: Vec<OpenAiMessage<'a>>,
    pub(super) stream: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct OpenAiMessage<'a> {
    pub(super) role: &'static str,
    pub(super) content: &'a str,
}

impl<'a> OpenAiRequest<'a> {
    /// The preamble is the system message, the rendered submission the user message.
    pub(super) fn new(model: &'a str, prompt: &'a Prompt) -> Self {
        Self {
            model,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: prompt.preamble(),
                },
                OpenAiMessage {
                    role: "user",
                    content: prompt.body(),
                },
            ],
            stream: true,
        }
    }
}
