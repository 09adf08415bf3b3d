//! Bearer credential validation settings.

use std::time::Duration;

use duration_str::deserialize_option_duration;
use serde::Deserialize;
use url::Url;

/// Settings for validating caller credentials against an identity provider.
///
/// Callers present a JWT as a bearer token. The token signature is checked
/// against the key set published at `url`, and its `sub` claim becomes the
/// session identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// The JWKS URL of the identity provider.
    pub url: Url,
    /// How long a fetched key set stays valid. Without it, the key set is
    /// fetched once and cached for the process lifetime.
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub poll_interval: Option<Duration>,
    /// Expected issuer (iss claim) for token validation.
    pub expected_issuer: Option<String>,
    /// Expected audience (aud claim) for token validation.
    pub expected_audience: Option<String>,
}
