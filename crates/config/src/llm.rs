//! Generation endpoint and model provider configuration.

use std::{borrow::Cow, fmt};

use secrecy::SecretString;
use serde::Deserialize;

/// Default maximum size of an accepted submission body, in bytes.
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Configuration of the generation endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// Whether the generation endpoint is enabled.
    enabled: bool,
    /// The path where the generation endpoint is mounted.
    pub path: Cow<'static, str>,
    /// The backend that serves generation requests.
    pub provider: ProviderKind,
    /// The instructional preamble placed before every submission.
    pub preset: PromptPreset,
    /// Maximum accepted request body size, in bytes.
    pub body_limit: usize,
    /// Per-backend connection settings.
    pub providers: ProvidersConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: Cow::Borrowed("/api"),
            provider: ProviderKind::default(),
            preset: PromptPreset::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            providers: ProvidersConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Whether the generation endpoint is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Connection settings of the selected backend, if it is configured.
    pub fn selected(&self) -> Option<&ProviderConfig> {
        self.providers.get(self.provider)
    }
}

/// Supported generation backends. This is the provider selector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini.
    #[default]
    Gemini,
    /// OpenAI chat completions.
    Openai,
}

impl ProviderKind {
    /// All supported backends.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::Openai];

    /// The selector value of this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Openai => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The instructional preamble family.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptPreset {
    /// Summarize a patient visit from a doctor's notes.
    #[default]
    Consultation,
    /// Analyze deployment logs and infrastructure details.
    Deployment,
}

/// Connection settings of every backend that may be selected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Google Gemini settings.
    pub gemini: Option<ProviderConfig>,
    /// OpenAI settings.
    pub openai: Option<ProviderConfig>,
}

impl ProvidersConfig {
    /// Settings of the given backend.
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::Openai => self.openai.as_ref(),
        }
    }

    /// Iterate over the configured backends.
    pub fn iter(&self) -> impl Iterator<Item = (ProviderKind, &ProviderConfig)> {
        ProviderKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|config| (kind, config)))
    }
}

/// Connection settings of a single backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key for authentication against the backend.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Custom base URL for the backend API.
    #[serde(default)]
    pub base_url: Option<String>,
    /// The model to generate with. Each backend has its own default.
    #[serde(default)]
    pub model: Option<String>,
}
