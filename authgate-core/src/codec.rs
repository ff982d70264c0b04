use crate::claims::{Claims, EXP};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while signing or validating tokens
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Token signing failed: {0}")]
    Signing(String),
    #[error("Token validation failed: {0}")]
    Invalid(String),
}

/// Signing and verification primitive for bearer tokens.
///
/// `validate` must reject bad signatures, malformed tokens and expired
/// tokens alike.
pub trait TokenCodec: Send + Sync {
    fn sign(&self, claims: &Claims, secret: &[u8], ttl: Duration) -> Result<String, CodecError>;

    fn validate(&self, token: &str, secret: &[u8]) -> Result<Claims, CodecError>;
}

/// HMAC-signed JWT codec.
///
/// An `exp` already present in the claims is kept as is, otherwise `sign`
/// stamps `now + ttl`. Validation uses no leeway and requires `exp`.
#[derive(Debug, Clone)]
pub struct JwtCodec {
    algorithm: Algorithm,
}

impl JwtCodec {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }
}

impl Default for JwtCodec {
    fn default() -> Self {
        Self::new(Algorithm::HS256)
    }
}

impl TokenCodec for JwtCodec {
    fn sign(&self, claims: &Claims, secret: &[u8], ttl: Duration) -> Result<String, CodecError> {
        let mut claims = claims.clone();
        if claims.exp().is_none() {
            let ttl = chrono::Duration::from_std(ttl)
                .map_err(|e| CodecError::Signing(format!("invalid ttl: {e}")))?;
            claims.insert(EXP, (Utc::now() + ttl).timestamp());
        }

        encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| CodecError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str, secret: &[u8]) -> Result<Claims, CodecError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;

        decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
            .map(|data| data.claims)
            .map_err(|e| CodecError::Invalid(e.to_string()))
    }
}
