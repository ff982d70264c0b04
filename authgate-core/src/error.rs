use crate::codec::CodecError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors returned by the session, gate and login operations.
///
/// None of these are retried inside the crate. Callers are expected to map
/// every authentication failure to the same generic denial so the response
/// does not reveal which check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid claims: {0}")]
    InvalidClaims(String),
    #[error("token is invalid or expired")]
    InvalidToken,
    #[error("token claims are missing '{0}'")]
    MalformedClaims(&'static str),
    #[error("session not found or no longer active")]
    SessionNotFound,
    #[error("token subject does not match the session subject")]
    SubjectMismatch,
    #[error("cross-reference record is corrupt: {0}")]
    CorruptRecord(String),
    #[error("missing or malformed Authorization header")]
    MissingOrMalformedHeader,
    #[error("missing or invalid oauth state")]
    MissingOrInvalidState,
    #[error("oauth state does not match")]
    StateMismatch,
    #[error("failed to exchange authorization code")]
    CodeExchangeFailed,
    #[error("failed to get user info from oauth provider")]
    OAuthUserInfoFailed,
    #[error("policy denied the request")]
    PolicyDenied,
    #[error("token store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("unknown oauth provider: {0}")]
    UnknownProvider(String),
    #[error("oauth provider is misconfigured: {0}")]
    ProviderMisconfigured(String),
    #[error("random source failure: {0}")]
    RandomSource(String),
    #[error("failed to sign token: {0}")]
    SigningFailed(String),
}

impl AuthError {
    /// Whether the error is a plain authentication/authorization rejection,
    /// as opposed to an infrastructure or internal-consistency failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            AuthError::StoreUnavailable(_)
                | AuthError::CorruptRecord(_)
                | AuthError::UnknownProvider(_)
                | AuthError::ProviderMisconfigured(_)
                | AuthError::RandomSource(_)
                | AuthError::SigningFailed(_)
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Signing(msg) => AuthError::SigningFailed(msg),
            CodecError::Invalid(_) => AuthError::InvalidToken,
        }
    }
}
