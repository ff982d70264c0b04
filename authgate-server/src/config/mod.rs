pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
use crate::config::oauth::OAuthConfig;
use crate::config::policy::PolicyConfig;
use crate::config::tokens::TokensConfig;
use crate::config::users::UsersConfig;
use confique::Config;

pub mod cache;
pub mod oauth;
pub mod policy;
pub mod tokens;
pub mod users;

/// Main configuration structure for the auth server
#[derive(Debug, Config, Clone)]
pub struct AppConfig {
    /// The port the server will listen to (default: 8080)
    #[config(env = "AUTHGATE_PORT", default = 8080)]
    pub port: u16,

    /// Public base URL of this server, used to build OAuth redirect URIs
    #[config(env = "AUTHGATE_PUBLIC_URL", default = "http://localhost:8080")]
    pub public_url: String,

    /// Token secrets and lifetimes
    #[config(nested)]
    pub tokens: TokensConfig,

    /// Token store configuration
    #[config(nested)]
    pub cache: CacheConfig,

    /// Identity provider credentials
    #[config(nested)]
    pub oauth: OAuthConfig,

    /// Optional OPA policy enforcement
    #[config(nested)]
    pub policy: PolicyConfig,

    /// Local user directory
    #[config(nested)]
    pub users: UsersConfig,
}

impl AppConfig {
    /// Creates a new config from `AUTHGATE_*` environment variables
    pub fn new() -> Result<Self, String> {
        Self::builder().env().load().map_err(|e| e.to_string())
    }

    /// Public URL the `/auth` routes are reachable under
    pub fn auth_base_url(&self) -> String {
        format!("{}/auth", self.public_url.trim_end_matches('/'))
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(opa_mock: &wiremock::MockServer) -> Self {
        let mut config = Self::builder()
            .load()
            .expect("Failed to load default config");
        config.port = 0;
        config.tokens.access_secret = "test-access-secret".to_string();
        config.tokens.refresh_secret = "test-refresh-secret".to_string();
        config.policy.enabled = true;
        config.policy.opa_url = opa_mock.uri();
        config.users.directory = "a@x.com=42,b@x.com=bob".to_string();
        config.oauth.request_timeout = 1;
        config
    }
}
