use std::collections::BTreeMap;

use config::{ProviderKind, ProvidersConfig};

use super::{Provider, gemini::GeminiProvider, openai::OpenAiProvider};
use crate::error::LlmError;

/// The configured generation backends, keyed by their selector.
#[derive(Default)]
pub(crate) struct Providers {
    providers: BTreeMap<ProviderKind, Box<dyn Provider>>,
}

impl Providers {
    /// Create an adapter for every backend that has an API key.
    pub(crate) fn new(config: &ProvidersConfig) -> crate::Result<Self> {
        let mut providers = Self::default();

        for (kind, provider_config) in config.iter() {
            if provider_config.api_key.is_none() {
                log::debug!("Skipping provider '{kind}' without an API key");
                continue;
            }

            let provider: Box<dyn Provider> = match kind {
                ProviderKind::Gemini => Box::new(GeminiProvider::new(provider_config)?),
                ProviderKind::Openai => Box::new(OpenAiProvider::new(provider_config)?),
            };

            log::debug!("Initialized provider '{kind}'");
            providers.insert(kind, provider);
        }

        Ok(providers)
    }

    pub(crate) fn insert(&mut self, kind: ProviderKind, provider: Box<dyn Provider>) {
        self.providers.insert(kind, provider);
    }

    /// Resolve the adapter for a selector.
    pub(crate) fn get(&self, kind: ProviderKind) -> crate::Result<&dyn Provider> {
        self.providers
            .get(&kind)
            .map(|provider| provider.as_ref())
            .ok_or_else(|| LlmError::Config(format!("Provider '{kind}' is not configured")))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
