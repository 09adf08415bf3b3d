//! CORS (Cross-Origin Resource Sharing) configuration.

use std::time::Duration;

use duration_str::deserialize_option_duration;
use serde::Deserialize;
use url::Url;

/// Configuration for CORS.
///
/// The allowed methods and request headers are fixed by the endpoint contract
/// (`GET`, `POST`, `OPTIONS` with `Content-Type` and `Authorization`), so only
/// the origin policy is configurable.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// If false (or not defined), credentials are not allowed in requests.
    pub allow_credentials: bool,
    /// Origins from which we allow requests.
    pub allow_origins: AllowedOrigins,
    /// Maximum time between OPTIONS and the next request.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_credentials: false,
            allow_origins: AllowedOrigins::Any,
            max_age: None,
        }
    }
}

/// Either every origin (`"*"`), or an explicit list of origins.
#[derive(Clone, Debug, PartialEq)]
pub enum AllowedOrigins {
    /// Any origin is allowed.
    Any,
    /// Only the listed origins are allowed.
    Explicit(Vec<Url>),
}

impl<'de> Deserialize<'de> for AllowedOrigins {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<Url>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::One(value) if value == "*" => Ok(AllowedOrigins::Any),
            Raw::One(value) => value
                .parse::<Url>()
                .map(|url| AllowedOrigins::Explicit(vec![url]))
                .map_err(serde::de::Error::custom),
            Raw::Many(urls) => Ok(AllowedOrigins::Explicit(urls)),
        }
    }
}
