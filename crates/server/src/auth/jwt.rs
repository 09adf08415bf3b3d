use config::{AuthConfig, SessionIdentity};
use http::{header::AUTHORIZATION, request::Parts};
use jwt_compact::{Algorithm, AlgorithmExt, TimeOptions, UntrustedToken, jwk::JsonWebKey};

use super::{
    AuthResult,
    claims::SessionClaims,
    error::AuthError,
    jwks::{Alg, Jwks, JwksCache},
};

const BEARER_TOKEN_LENGTH: usize = 6;

/// Verifies bearer session tokens against the identity provider's keys.
pub struct JwtAuth {
    config: AuthConfig,
    jwks_cache: JwksCache,
}

impl JwtAuth {
    pub fn new(config: AuthConfig) -> Self {
        let jwks_cache = JwksCache::new(config.url.clone(), config.poll_interval);

        JwtAuth { config, jwks_cache }
    }

    /// Resolve the caller of a request from its `Authorization` header.
    pub async fn authenticate(&self, parts: &Parts) -> AuthResult<SessionIdentity> {
        let token_str = bearer_token(parts)?;
        let token = UntrustedToken::new(token_str).map_err(|_| AuthError::InvalidToken("invalid token"))?;

        let jwks = self.jwks_cache.get().await.map_err(|e| {
            log::error!("Failed to fetch signing keys: {e}");
            AuthError::Internal
        })?;

        let token = self.validate_token(&jwks, token).ok_or(AuthError::Unauthorized)?;

        let Some(subject) = token.claims().custom.subject() else {
            log::debug!("Token rejected: missing subject claim");
            return Err(AuthError::InvalidToken("missing subject"));
        };

        Ok(SessionIdentity {
            subject: subject.to_string(),
        })
    }

    fn validate_token(
        &self,
        jwks: &Jwks<'_>,
        untrusted_token: UntrustedToken<'_>,
    ) -> Option<jwt_compact::Token<SessionClaims>> {
        use jwt_compact::alg::*;

        let Some(alg) = Alg::from_name(untrusted_token.algorithm()) else {
            log::debug!("Token rejected: unsupported algorithm {}", untrusted_token.algorithm());
            return None;
        };

        let time_options = TimeOptions::default();

        jwks.keys
            .iter()
            .filter(|jwk| match (&untrusted_token.header().key_id, &jwk.key_id) {
                (Some(expected), Some(kid)) => expected == kid,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter_map(|jwk| match alg {
                Alg::HS256 => decode(Hs256, &jwk.key, &untrusted_token),
                Alg::HS384 => decode(Hs384, &jwk.key, &untrusted_token),
                Alg::HS512 => decode(Hs512, &jwk.key, &untrusted_token),
                Alg::ES256 => decode(Es256, &jwk.key, &untrusted_token),
                Alg::RS256 => decode(Rsa::rs256(), &jwk.key, &untrusted_token),
                Alg::RS384 => decode(Rsa::rs384(), &jwk.key, &untrusted_token),
                Alg::RS512 => decode(Rsa::rs512(), &jwk.key, &untrusted_token),
                Alg::PS256 => decode(Rsa::ps256(), &jwk.key, &untrusted_token),
                Alg::PS384 => decode(Rsa::ps384(), &jwk.key, &untrusted_token),
                Alg::PS512 => decode(Rsa::ps512(), &jwk.key, &untrusted_token),
                Alg::EdDSA => decode(Ed25519, &jwk.key, &untrusted_token),
            })
            .find(|token| {
                let claims = token.claims();

                let time_valid = claims.validate_expiration(&time_options).is_ok()
                    && (claims.not_before.is_none() || claims.validate_maturity(&time_options).is_ok());

                if !time_valid {
                    log::debug!("Token rejected: expired or not yet valid");
                }

                time_valid && self.validate_issuer(&claims.custom) && self.validate_audience(&claims.custom)
            })
    }

    fn validate_issuer(&self, claims: &SessionClaims) -> bool {
        let Some(expected_issuer) = &self.config.expected_issuer else {
            return true;
        };

        match claims.issuer() {
            Some(issuer) if issuer == expected_issuer => true,
            Some(_) => {
                log::debug!("Token rejected: invalid issuer");
                false
            }
            None => {
                log::debug!("Token rejected: missing issuer claim");
                false
            }
        }
    }

    fn validate_audience(&self, claims: &SessionClaims) -> bool {
        let Some(expected_audience) = &self.config.expected_audience else {
            return true;
        };

        if claims.has_audience(expected_audience) {
            true
        } else {
            log::debug!("Token rejected: audience validation failed");
            false
        }
    }
}

/// The token of a `Bearer` authorization header. The scheme is case-insensitive.
fn bearer_token(parts: &Parts) -> AuthResult<&str> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::InvalidToken("missing token"))?;

    let value = header.to_str().map_err(|_| AuthError::InvalidToken("invalid token"))?;

    if value.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken("missing token"));
    }

    let (scheme, token) = value
        .split_at_checked(BEARER_TOKEN_LENGTH)
        .ok_or(AuthError::InvalidToken("token must be prefixed with Bearer"))?;

    let token = match token.strip_prefix(' ') {
        Some(token) if scheme.eq_ignore_ascii_case("bearer") => token,
        _ => return Err(AuthError::InvalidToken("token must be prefixed with Bearer")),
    };

    if token.is_empty() {
        return Err(AuthError::InvalidToken("missing token"));
    }

    Ok(token)
}

fn decode<A: Algorithm>(
    alg: A,
    jwk: &JsonWebKey<'_>,
    untrusted_token: &UntrustedToken<'_>,
) -> Option<jwt_compact::Token<SessionClaims>>
where
    A::VerifyingKey: std::fmt::Debug + for<'a> TryFrom<&'a JsonWebKey<'a>>,
{
    let key = A::VerifyingKey::try_from(jwk).ok()?;
    alg.validator(&key).validate(untrusted_token).ok()
}
