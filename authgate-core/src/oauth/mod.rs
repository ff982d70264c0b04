//! OAuth 2.0 login against third-party identity providers.
//!
//! A login attempt is a redirect to the provider ([`OAuthFlow::begin_login`])
//! followed by the provider calling back with `state` and `code`
//! ([`OAuthFlow::complete_login`]). The callback is only trusted when its
//! `state` matches the anti-forgery cookie set by the redirect.

mod flow;
pub mod providers;
mod registry;
mod state;

pub use flow::{CallbackParams, LoginRedirect, LoginStage, OAuthFlow};
pub use registry::ProviderRegistry;
pub use state::{clear_cookie, read_cookie, AntiForgeryState, ANTI_FORGERY_COOKIE, STATE_EXPIRY};

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while talking to an identity provider.
///
/// These carry the raw provider text for logging. They are never returned
/// to end users as is.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request to provider failed: {0}")]
    Request(String),
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Request(err.to_string())
    }
}

/// Authorization and token URLs of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub auth_url: String,
    pub token_url: String,
}

impl Endpoint {
    pub fn new(auth_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            token_url: token_url.into(),
        }
    }
}

/// Identity reported by a provider, normalised across providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub external_id: String,
    pub email: String,
}

/// Capability set of one identity provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name used in routes and redirect URIs, e.g. `google`.
    fn name(&self) -> &str;

    fn scopes(&self) -> &[&str];

    fn endpoint(&self) -> &Endpoint;

    fn client_id(&self) -> &str;

    fn client_secret(&self) -> &str;

    /// Fetches the user's identity with a provider access token.
    async fn user_info(&self, access_token: &str) -> Result<UserInfo, ProviderError>;
}

/// Error type returned by user resolvers.
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Maps a provider-verified email to a local subject identifier.
///
/// Supplied by the embedding application. The returned value becomes the
/// session's `sub` claim.
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn lookup_by_email(&self, email: &str) -> Result<Value, ResolveError>;
}

/// Sends a provider request and decodes a successful JSON response.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("Provider responded with status {}", status);
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Parse(e.to_string()))
}
