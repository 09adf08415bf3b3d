//! A local identity provider: publishes a symmetric signing key and mints
//! session tokens signed with it.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{Json, Router, extract::State, routing::get};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jwt_compact::{
    AlgorithmExt, Claims, Header, TimeOptions,
    alg::{Hs256, Hs256Key},
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

const SIGNING_SECRET: &[u8] = b"consult-integration-test-signing-secret";
const KEY_ID: &str = "test-key";

pub const TEST_ISSUER: &str = "https://identity.example.com";
pub const TEST_AUDIENCE: &str = "consult";

/// Claims of a minted session token.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl TokenClaims {
    /// A subject with the test issuer and audience.
    pub fn for_subject(subject: &str) -> Self {
        Self {
            iss: Some(TEST_ISSUER.to_string()),
            aud: Some(json!(TEST_AUDIENCE)),
            sub: Some(subject.to_string()),
        }
    }
}

/// Serves the JWKS document and counts how often it was fetched.
pub struct MockJwks {
    address: SocketAddr,
    fetches: Arc<AtomicUsize>,
}

impl MockJwks {
    pub async fn start() -> Self {
        let fetches = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route("/.well-known/jwks.json", get(jwks))
            .with_state(fetches.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        Self { address, fetches }
    }

    /// The value for `server.auth.url`.
    pub fn url(&self) -> String {
        format!("http://{}/.well-known/jwks.json", self.address)
    }

    /// How many times the key set was fetched.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

async fn jwks(State(fetches): State<Arc<AtomicUsize>>) -> Json<Value> {
    fetches.fetch_add(1, Ordering::SeqCst);

    Json(json!({
        "keys": [{
            "kty": "oct",
            "k": URL_SAFE_NO_PAD.encode(SIGNING_SECRET),
            "kid": KEY_ID,
        }]
    }))
}

fn sign(claims: Claims<TokenClaims>, secret: &[u8]) -> String {
    let header = Header::empty().with_key_id(KEY_ID);

    Hs256.token(&header, &claims, &Hs256Key::new(secret)).unwrap()
}

/// A token valid for an hour.
pub fn token(claims: TokenClaims) -> String {
    let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), chrono::Duration::hours(1));

    sign(claims, SIGNING_SECRET)
}

/// A token for the subject with the test issuer and audience.
pub fn token_for(subject: &str) -> String {
    token(TokenClaims::for_subject(subject))
}

/// A token that expired an hour ago.
pub fn expired_token(subject: &str) -> String {
    let mut claims = Claims::new(TokenClaims::for_subject(subject));
    claims.expiration = Some(chrono::Utc::now() - chrono::Duration::hours(1));

    sign(claims, SIGNING_SECRET)
}

/// A token signed with a key the identity provider does not publish.
pub fn foreign_token(subject: &str) -> String {
    let claims = Claims::new(TokenClaims::for_subject(subject))
        .set_duration_and_issuance(&TimeOptions::default(), chrono::Duration::hours(1));

    sign(claims, b"some-other-signing-secret-entirely")
}
