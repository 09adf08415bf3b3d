use config::{ProviderConfig, ProviderKind};
use secrecy::SecretString;

use crate::error::LlmError;

/// The API key a backend authenticates with.
///
/// Keys are never forwarded from callers, the configured key is the only one.
pub(super) fn api_key(kind: ProviderKind, config: &ProviderConfig) -> crate::Result<SecretString> {
    config
        .api_key
        .clone()
        .ok_or_else(|| LlmError::Config(format!("No API key configured for provider '{kind}'")))
}
