use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{Account, AccountId, AccountRole};

/// Claims carried inside the signed bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: AccountRole,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated identity resolved from an `Authorization` header. Handlers
/// trust these verified claims and never re-derive identity from request
/// bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: AccountId,
    pub email: String,
    pub role: AccountRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("missing bearer credential")]
    Missing,
    #[error("bearer credential is not valid")]
    Invalid,
    #[error("bearer credential has expired")]
    Expired,
    #[error("bearer credential could not be signed")]
    Signing,
}

/// Signed credential plus its expiry instant.
#[derive(Debug, Clone)]
pub struct SignedBearer {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 signer/verifier over a shared secret from configuration.
pub struct BearerSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

impl BearerSigner {
    pub fn new(secret: &str, validity: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity,
        }
    }

    pub fn issue(&self, account: &Account, now: DateTime<Utc>) -> Result<SignedBearer, BearerError> {
        let expires_at = now + self.validity;
        let claims = BearerClaims {
            sub: account.id.0,
            email: account.email.to_string(),
            role: account.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| BearerError::Signing)?;
        Ok(SignedBearer { token, expires_at })
    }

    /// Expiry is checked against the caller-provided clock, not the host
    /// clock.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Caller, BearerError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<BearerClaims>(token, &self.decoding, &validation)
            .map_err(|_| BearerError::Invalid)?;

        if data.claims.exp <= now.timestamp() {
            return Err(BearerError::Expired);
        }

        Ok(Caller {
            account_id: AccountId(data.claims.sub),
            email: data.claims.email,
            role: data.claims.role,
        })
    }

    pub fn authorize(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Result<Caller, BearerError> {
        let value = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(BearerError::Missing)?;
        let token = value.strip_prefix("Bearer ").ok_or(BearerError::Missing)?;
        self.verify(token.trim(), now)
    }
}
