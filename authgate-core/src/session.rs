//! Token issuance, cross-reference bookkeeping, refresh and revocation.

use crate::claims::{Claims, SubjectId, EMAIL, EXP, SUB, UUID};
use crate::codec::TokenCodec;
use crate::error::AuthError;
use crate::store::{StoreItem, TokenStore};
use chrono::Utc;
use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Secrets and lifetimes for the two halves of a token pair.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_secret: Vec<u8>,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    /// Settings with freshly generated per-process secrets.
    pub fn with_random_secrets(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            access_secret: random_secret(32),
            access_ttl,
            refresh_secret: random_secret(32),
            refresh_ttl,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self::with_random_secrets(
            Duration::from_secs(15 * 60),
            Duration::from_secs(7 * 24 * 60 * 60),
        )
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_secret", &"<redacted>")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Generates an alphanumeric secret of the given length.
pub fn random_secret(len: usize) -> Vec<u8> {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .collect()
}

/// Access and refresh tokens of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, unix seconds
    pub access_expires_at: i64,
    /// Refresh token expiry, unix seconds
    pub refresh_expires_at: i64,
    #[serde(skip)]
    pub(crate) access_uuid: String,
    #[serde(skip)]
    pub(crate) refresh_uuid: String,
}

/// Value stored under a token's UUID.
///
/// The access record names its refresh sibling and vice versa, so either
/// UUID discovers the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CrossReference {
    #[serde(default)]
    pub(crate) sub: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) refresh_token_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) access_token_uuid: Option<String>,
}

impl CrossReference {
    fn for_access(sub: Value, refresh_uuid: &str) -> Self {
        Self {
            sub: Some(sub),
            refresh_token_uuid: Some(refresh_uuid.to_string()),
            access_token_uuid: None,
        }
    }

    fn for_refresh(sub: Value, access_uuid: &str) -> Self {
        Self {
            sub: Some(sub),
            refresh_token_uuid: None,
            access_token_uuid: Some(access_uuid.to_string()),
        }
    }

    pub(crate) fn subject(&self) -> Result<SubjectId, AuthError> {
        self.sub
            .as_ref()
            .and_then(SubjectId::from_value)
            .ok_or_else(|| AuthError::CorruptRecord("sub not found in record".to_string()))
    }

    fn encode(&self) -> Result<Vec<u8>, AuthError> {
        serde_json::to_vec(self)
            .map_err(|e| AuthError::CorruptRecord(format!("failed to encode record: {e}")))
    }
}

struct IssuedToken {
    uuid: String,
    value: String,
    expires_at: i64,
}

/// Owns the session invariant: a session's two tokens are always jointly
/// discoverable through the store and jointly destroyable.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    codec: Arc<dyn TokenCodec>,
    settings: TokenSettings,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        codec: Arc<dyn TokenCodec>,
        settings: TokenSettings,
    ) -> Self {
        Self {
            store,
            codec,
            settings,
        }
    }

    /// Issues a token pair and persists both cross-reference records in one batch.
    ///
    /// Nothing is written when the claims lack `sub` or `email`. If the batch
    /// write fails the session does not exist and the error is returned.
    pub async fn create_session(&self, claims: &Claims) -> Result<TokenPair, AuthError> {
        claims.validate_required()?;
        let sub = claims
            .sub()
            .cloned()
            .ok_or_else(|| AuthError::InvalidClaims("missing sub from claims".to_string()))?;

        let access = self.issue(claims, &self.settings.access_secret, self.settings.access_ttl)?;
        let refresh = self.issue(
            claims,
            &self.settings.refresh_secret,
            self.settings.refresh_ttl,
        )?;

        let items = [
            StoreItem::new(
                access.uuid.clone(),
                CrossReference::for_access(sub.clone(), &refresh.uuid).encode()?,
                self.settings.access_ttl,
            ),
            StoreItem::new(
                refresh.uuid.clone(),
                CrossReference::for_refresh(sub, &access.uuid).encode()?,
                self.settings.refresh_ttl,
            ),
        ];
        self.store.put(&items).await?;

        debug!(
            "Created session {} / {} for subject '{}'",
            access.uuid,
            refresh.uuid,
            claims.subject().map(|s| s.to_string()).unwrap_or_default()
        );

        Ok(TokenPair {
            access_token: access.value,
            refresh_token: refresh.value,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
            access_uuid: access.uuid,
            refresh_uuid: refresh.uuid,
        })
    }

    /// Revokes the session owning the given access token.
    ///
    /// Both records are deleted in one call. When a concurrent revocation
    /// already removed them the result is `SessionNotFound`.
    pub async fn destroy_session(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self.extract_access_claims(access_token)?;
        let access_uuid = claims.uuid().ok_or(AuthError::MalformedClaims(UUID))?;

        let record = self.load_record(access_uuid).await?;
        let refresh_uuid = record.refresh_token_uuid.as_deref().ok_or_else(|| {
            AuthError::CorruptRecord("refresh_token_uuid not found in access record".to_string())
        })?;

        let removed = self.store.delete(&[access_uuid, refresh_uuid]).await?;
        if removed == 0 {
            debug!("Session {} was already revoked", access_uuid);
            return Err(AuthError::SessionNotFound);
        }

        info!("Destroyed session {} / {}", access_uuid, refresh_uuid);
        Ok(())
    }

    /// Rotates a session: the refresh token's session is revoked and a new
    /// pair is issued with the same claims.
    ///
    /// A refresh token is single-use. Presenting it again, or after logout,
    /// yields `SessionNotFound`.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.extract_refresh_claims(refresh_token)?;
        let refresh_uuid = claims.uuid().ok_or(AuthError::MalformedClaims(UUID))?;
        let subject = claims.subject().ok_or(AuthError::MalformedClaims(SUB))?;
        if claims.email().is_none() {
            return Err(AuthError::MalformedClaims(EMAIL));
        }

        let record = self.load_record(refresh_uuid).await?;
        if record.subject()? != subject {
            warn!("Refresh token subject does not match record {}", refresh_uuid);
            return Err(AuthError::SubjectMismatch);
        }
        let access_uuid = record.access_token_uuid.as_deref().ok_or_else(|| {
            AuthError::CorruptRecord("access_token_uuid not found in refresh record".to_string())
        })?;

        let removed = self.store.delete(&[access_uuid, refresh_uuid]).await?;
        if removed == 0 {
            debug!("Refresh token {} was already used", refresh_uuid);
            return Err(AuthError::SessionNotFound);
        }

        let pair = self.create_session(&claims).await?;
        info!(
            "Refreshed session {} -> {} for subject '{}'",
            access_uuid, pair.access_uuid, subject
        );
        Ok(pair)
    }

    /// Validates an access token and returns its claims.
    pub fn extract_access_claims(&self, token: &str) -> Result<Claims, AuthError> {
        self.codec
            .validate(token, &self.settings.access_secret)
            .map_err(|e| {
                debug!("Access token rejected: {}", e);
                AuthError::InvalidToken
            })
    }

    /// Validates a refresh token and returns its claims.
    pub fn extract_refresh_claims(&self, token: &str) -> Result<Claims, AuthError> {
        self.codec
            .validate(token, &self.settings.refresh_secret)
            .map_err(|e| {
                debug!("Refresh token rejected: {}", e);
                AuthError::InvalidToken
            })
    }

    /// Checks the underlying store.
    pub async fn health_check(&self) -> Result<(), String> {
        self.store.health_check().await
    }

    pub(crate) async fn load_record(&self, token_uuid: &str) -> Result<CrossReference, AuthError> {
        let bytes = self
            .store
            .get(token_uuid)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::CorruptRecord(format!("failed to decode record: {e}")))
    }

    fn issue(&self, claims: &Claims, secret: &[u8], ttl: Duration) -> Result<IssuedToken, AuthError> {
        let uuid = Uuid::new_v4().to_string();
        let lifetime = i64::try_from(ttl.as_secs())
            .map_err(|_| AuthError::SigningFailed("token ttl out of range".to_string()))?;
        let expires_at = Utc::now().timestamp() + lifetime;

        let mut token_claims = claims.clone();
        token_claims.insert(EXP, expires_at);
        token_claims.insert(UUID, uuid.clone());

        let value = self.codec.sign(&token_claims, secret, ttl)?;
        Ok(IssuedToken {
            uuid,
            value,
            expires_at,
        })
    }
}
