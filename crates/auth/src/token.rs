//! Signed bearer tokens.
//!
//! Tokens carry `{id, is_admin}` and are verified by signature alone unless a
//! TTL is configured, in which case `exp` becomes mandatory.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::{Principal, TokenClaims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(String),

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Encodes and verifies the signed claim set.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, subject_id: i64, is_admin: bool) -> Result<String, TokenError>;

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError>;

    fn issue(&self, principal: Principal) -> Result<String, TokenError> {
        self.encode(principal.subject_id(), principal.is_admin())
    }
}

/// HMAC-SHA256 codec over a shared secret.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl Hs256TokenCodec {
    /// `ttl: None` issues tokens without `exp` that never expire.
    pub fn new(secret: impl AsRef<[u8]>, ttl: Option<Duration>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = ttl.is_some();
        if ttl.is_some() {
            validation.required_spec_claims.insert("exp".to_string());
        }

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Encode with an explicit issue time (deterministic tests, clock injection).
    pub fn encode_at(
        &self,
        subject_id: i64,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let exp = match self.ttl {
            Some(ttl) => {
                let secs = i64::try_from(ttl.as_secs())
                    .map_err(|_| TokenError::Encode("token ttl out of range".to_string()))?;
                Some(iat.saturating_add(secs))
            }
            None => None,
        };

        let claims = TokenClaims {
            id: subject_id,
            is_admin,
            iat,
            exp,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn encode(&self, subject_id: i64, is_admin: bool) -> Result<String, TokenError> {
        self.encode_at(subject_id, is_admin, Utc::now())
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}
