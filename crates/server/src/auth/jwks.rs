//! The identity provider's published signing keys.

use std::{
    borrow::Cow,
    time::{Duration, Instant},
};

use jwt_compact::jwk::JsonWebKey;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Jwks<'a> {
    pub keys: Vec<Jwk<'a>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Jwk<'a> {
    #[serde(flatten)]
    pub key: JsonWebKey<'a>,
    #[serde(rename = "kid")]
    pub key_id: Option<Cow<'a, str>>,
}

struct Fetched {
    keys: Jwks<'static>,
    at: Instant,
}

impl Fetched {
    fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        ttl.is_none_or(|ttl| self.at.elapsed() <= ttl)
    }
}

/// Key set fetched on first use and kept for `ttl`, or forever without one.
pub struct JwksCache {
    url: Url,
    ttl: Option<Duration>,
    client: reqwest::Client,
    current: RwLock<Option<Fetched>>,
    refresh: Mutex<()>,
}

impl JwksCache {
    pub fn new(url: Url, ttl: Option<Duration>) -> Self {
        Self {
            url,
            ttl,
            client: reqwest::Client::new(),
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    async fn fresh(&self) -> Option<Jwks<'static>> {
        let current = self.current.read().await;

        current
            .as_ref()
            .filter(|fetched| fetched.is_fresh(self.ttl))
            .map(|fetched| fetched.keys.clone())
    }

    pub async fn get(&self) -> anyhow::Result<Jwks<'static>> {
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        // One request refetches, the ones queued behind it reuse the result.
        let _refresh = self.refresh.lock().await;

        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        let keys = self.fetch().await?;

        *self.current.write().await = Some(Fetched {
            keys: keys.clone(),
            at: Instant::now(),
        });

        Ok(keys)
    }

    async fn fetch(&self) -> anyhow::Result<Jwks<'static>> {
        log::debug!("Fetching signing keys from {}", self.url);

        let response = self.client.get(self.url.clone()).send().await?.error_for_status()?;
        let keys: Jwks<'static> = response.json().await?;

        log::debug!("Identity provider published {} signing keys", keys.keys.len());

        Ok(keys)
    }
}

/// Token signing algorithms we can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alg {
    HS256,
    HS384,
    HS512,
    ES256,
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    EdDSA,
}

impl Alg {
    /// The algorithm named by a token's `alg` header.
    pub fn from_name(name: &str) -> Option<Self> {
        let alg = match name {
            "HS256" => Alg::HS256,
            "HS384" => Alg::HS384,
            "HS512" => Alg::HS512,
            "ES256" => Alg::ES256,
            "RS256" => Alg::RS256,
            "RS384" => Alg::RS384,
            "RS512" => Alg::RS512,
            "PS256" => Alg::PS256,
            "PS384" => Alg::PS384,
            "PS512" => Alg::PS512,
            "EdDSA" => Alg::EdDSA,
            _ => return None,
        };

        Some(alg)
    }
}
