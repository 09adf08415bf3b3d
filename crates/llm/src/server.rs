use config::{LlmConfig, PromptPreset, ProviderKind};

use crate::{
    error::LlmError,
    prompt::Prompt,
    provider::{FragmentStream, Providers},
    submission::Submission,
};

/// Everything a generation request needs, shared by all requests.
pub(crate) struct GenerationServer {
    providers: Providers,
    selected: ProviderKind,
    preset: PromptPreset,
    body_limit: usize,
}

impl GenerationServer {
    pub fn new(config: &LlmConfig) -> crate::Result<Self> {
        let providers = Providers::new(&config.providers)?;

        if providers.is_empty() {
            return Err(LlmError::Config("No provider has an API key configured".to_string()));
        }

        // Validated once here, so a request never finds out about a bad selector.
        providers.get(config.provider)?;

        log::debug!(
            "Generation endpoint initialized with provider '{}' and preset {:?}",
            config.provider,
            config.preset
        );

        Ok(Self::with_providers(
            providers,
            config.provider,
            config.preset,
            config.body_limit,
        ))
    }

    pub(crate) fn with_providers(
        providers: Providers,
        selected: ProviderKind,
        preset: PromptPreset,
        body_limit: usize,
    ) -> Self {
        Self {
            providers,
            selected,
            preset,
            body_limit,
        }
    }

    pub(crate) fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Build the prompt for a submission and open the fragment stream of the selected provider.
    pub(crate) async fn generate(&self, submission: Submission) -> crate::Result<FragmentStream> {
        let provider = self.providers.get(self.selected)?;
        let prompt = Prompt::build(self.preset, submission);

        log::debug!("Starting generation with provider '{}'", provider.name());

        provider.generate(&prompt).await
    }
}
