use super::state::{read_cookie, AntiForgeryState};
use super::{send_json, Provider, ProviderError, ProviderRegistry, UserResolver};
use crate::claims::Claims;
use crate::error::AuthError;
use crate::session::{SessionManager, TokenPair};
use http::header::ACCEPT;
use http::HeaderMap;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Progress of a single login attempt. Every failure is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Start,
    RedirectIssued,
    StateValidated,
    CodeExchanged,
    IdentityResolved,
    SessionCreated,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            LoginStage::Start => "start",
            LoginStage::RedirectIssued => "redirect-issued",
            LoginStage::StateValidated => "state-validated",
            LoginStage::CodeExchanged => "code-exchanged",
            LoginStage::IdentityResolved => "identity-resolved",
            LoginStage::SessionCreated => "session-created",
        };
        f.write_str(stage)
    }
}

/// Where to send the browser and the cookie to set on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub url: String,
    pub set_cookie: String,
}

/// Query parameters of the provider callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
struct ProviderToken {
    access_token: String,
}

/// Drives redirect, callback and identity resolution for registered providers.
pub struct OAuthFlow {
    registry: Arc<ProviderRegistry>,
    sessions: Arc<SessionManager>,
    users: Arc<dyn UserResolver>,
    http_client: Client,
    auth_base_url: String,
}

impl OAuthFlow {
    /// `auth_base_url` is the public URL the auth routes are mounted under;
    /// redirect URIs are `<auth_base_url>/<provider>/callback`.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        sessions: Arc<SessionManager>,
        users: Arc<dyn UserResolver>,
        auth_base_url: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            sessions,
            users,
            http_client: Client::new(),
            auth_base_url: auth_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Client used for the code exchange. Providers carry their own client
    /// for user-info calls.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn redirect_uri(&self, provider: &str) -> String {
        format!("{}/{}/callback", self.auth_base_url, provider)
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.auth_base_url.starts_with("https://")
    }

    /// Starts a login: fresh anti-forgery state plus the provider's authorization URL.
    pub fn begin_login(&self, provider_name: &str) -> Result<LoginRedirect, AuthError> {
        let provider = self.provider(provider_name)?;
        debug!("Login via '{}': {}", provider_name, LoginStage::Start);

        let state = AntiForgeryState::generate()?;
        let url = self.authorization_url(provider.as_ref(), state.as_str())?;

        debug!("Login via '{}': {}", provider_name, LoginStage::RedirectIssued);
        Ok(LoginRedirect {
            url,
            set_cookie: state.set_cookie(self.secure_cookies()),
        })
    }

    /// Finishes a login from the provider callback and creates a session.
    ///
    /// The callback is rejected before any provider call unless the `state`
    /// parameter matches the anti-forgery cookie exactly.
    pub async fn complete_login(
        &self,
        provider_name: &str,
        params: &CallbackParams,
        headers: &HeaderMap,
    ) -> Result<TokenPair, AuthError> {
        let provider = self.provider(provider_name)?;

        let saved_state = match read_cookie(headers) {
            Some(saved) if !params.state.is_empty() => saved,
            _ => {
                warn!("Login via '{}': missing anti-forgery state", provider_name);
                return Err(AuthError::MissingOrInvalidState);
            }
        };
        if saved_state != params.state {
            warn!("Login via '{}': anti-forgery state mismatch", provider_name);
            return Err(AuthError::StateMismatch);
        }
        debug!("Login via '{}': {}", provider_name, LoginStage::StateValidated);

        if params.code.trim().is_empty() {
            warn!("Login via '{}': callback carried no code", provider_name);
            return Err(AuthError::CodeExchangeFailed);
        }

        let access_token = self
            .exchange_code(provider.as_ref(), &params.code)
            .await
            .map_err(|e| {
                error!(
                    "Failed to exchange code for token with '{}': {}",
                    provider_name, e
                );
                AuthError::CodeExchangeFailed
            })?;
        debug!("Login via '{}': {}", provider_name, LoginStage::CodeExchanged);

        let user = provider.user_info(&access_token).await.map_err(|e| {
            error!(
                "Failed to get user info from '{}': {}",
                provider_name, e
            );
            AuthError::OAuthUserInfoFailed
        })?;
        if user.email.trim().is_empty() {
            warn!(
                "Provider '{}' returned no email for user '{}'",
                provider_name, user.external_id
            );
            return Err(AuthError::OAuthUserInfoFailed);
        }

        let sub = self.users.lookup_by_email(&user.email).await.map_err(|e| {
            warn!("Failed to resolve local user for '{}': {}", provider_name, e);
            AuthError::OAuthUserInfoFailed
        })?;
        debug!("Login via '{}': {}", provider_name, LoginStage::IdentityResolved);

        let pair = self
            .sessions
            .create_session(&Claims::for_subject(sub, user.email))
            .await?;
        info!(
            "Login via '{}': {} for external user '{}'",
            provider_name,
            LoginStage::SessionCreated,
            user.external_id
        );
        Ok(pair)
    }

    fn provider(&self, name: &str) -> Result<Arc<dyn Provider>, AuthError> {
        self.registry
            .get(name)
            .ok_or_else(|| AuthError::UnknownProvider(name.to_string()))
    }

    fn authorization_url(&self, provider: &dyn Provider, state: &str) -> Result<String, AuthError> {
        let mut url = Url::parse(&provider.endpoint().auth_url).map_err(|e| {
            error!(
                "Invalid authorization URL for '{}': {}",
                provider.name(),
                e
            );
            AuthError::ProviderMisconfigured(provider.name().to_string())
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", provider.client_id())
            .append_pair("redirect_uri", &self.redirect_uri(provider.name()))
            .append_pair("response_type", "code")
            .append_pair("scope", &provider.scopes().join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    async fn exchange_code(&self, provider: &dyn Provider, code: &str) -> Result<String, ProviderError> {
        let redirect_uri = self.redirect_uri(provider.name());
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", provider.client_id()),
            ("client_secret", provider.client_secret()),
        ];

        // GitHub answers form-encoded unless JSON is requested
        let request = self
            .http_client
            .post(&provider.endpoint().token_url)
            .header(ACCEPT, "application/json")
            .form(&params);

        let token: ProviderToken = send_json(request).await?;
        Ok(token.access_token)
    }
}
