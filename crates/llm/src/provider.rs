mod bridge;
pub(crate) mod gemini;
pub(crate) mod openai;
mod registry;
mod token;

pub(crate) use registry::Providers;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::prompt::Prompt;

/// A piece of generated text, in upstream arrival order.
///
/// May be empty or contain line breaks. Concatenating all fragments of a
/// sequence yields the generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fragment(String);

impl Fragment {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Type alias for a stream of generated fragments.
///
/// The stream is finite and ends either after the last fragment, or after a
/// single error item. Dropping it cancels the upstream generation.
pub(crate) type FragmentStream = Pin<Box<dyn Stream<Item = crate::Result<Fragment>> + Send>>;

/// Trait for generation backends.
///
/// Note for async_trait: We need this trait to be dyn-compatible, so we can't just use the
/// Rust async trait functions without Box/Pin.
#[async_trait]
pub(crate) trait Provider: Send + Sync {
    /// Start generating a reply to the prompt.
    ///
    /// Failures before the upstream response body starts are returned directly,
    /// later failures are yielded as the last item of the stream.
    async fn generate(&self, prompt: &Prompt) -> crate::Result<FragmentStream>;

    /// Get the provider name.
    fn name(&self) -> &str;
}
