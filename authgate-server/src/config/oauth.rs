//! Identity provider credentials

use authgate_core::oauth::providers::{GitHubProvider, GoogleProvider};
use authgate_core::ProviderRegistry;
use confique::Config;
use log::info;
use reqwest::Client;
use std::fmt;

/// OAuth 2.0 provider configuration. A provider is enabled when its client id is set.
#[derive(Config, Clone)]
pub struct OAuthConfig {
    #[config(env = "AUTHGATE_OAUTH_GOOGLE_CLIENT_ID", default = "")]
    pub google_client_id: String,

    #[config(env = "AUTHGATE_OAUTH_GOOGLE_CLIENT_SECRET", default = "")]
    pub google_client_secret: String,

    #[config(env = "AUTHGATE_OAUTH_GITHUB_CLIENT_ID", default = "")]
    pub github_client_id: String,

    #[config(env = "AUTHGATE_OAUTH_GITHUB_CLIENT_SECRET", default = "")]
    pub github_client_secret: String,

    /// Timeout in seconds for every call to a provider (default: 10)
    #[config(env = "AUTHGATE_OAUTH_REQUEST_TIMEOUT", default = 10)]
    pub request_timeout: u64,
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &"<redacted>")
            .field("github_client_id", &self.github_client_id)
            .field("github_client_secret", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl OAuthConfig {
    /// Builds the provider registry from the configured credentials.
    ///
    /// Every provider shares `client` for its user-info calls.
    pub fn build_registry(&self, client: &Client) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();

        if !self.google_client_id.is_empty() {
            registry = registry.with_provider(
                GoogleProvider::new(&self.google_client_id, &self.google_client_secret)
                    .with_http_client(client.clone()),
            );
        }
        if !self.github_client_id.is_empty() {
            registry = registry.with_provider(
                GitHubProvider::new(&self.github_client_id, &self.github_client_secret)
                    .with_http_client(client.clone()),
            );
        }

        info!("OAuth providers enabled: {:?}", registry.names());
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google_only() -> OAuthConfig {
        OAuthConfig {
            google_client_id: "google-id".to_string(),
            google_client_secret: "google-secret".to_string(),
            github_client_id: String::new(),
            github_client_secret: String::new(),
            request_timeout: 10,
        }
    }

    #[test]
    fn test_no_providers_by_default() {
        let config = OAuthConfig::builder().load().unwrap();
        assert_eq!(config.request_timeout, 10);
        assert!(config.build_registry(&Client::new()).is_empty());
    }

    #[test]
    fn test_registry_from_credentials() {
        let registry = google_only().build_registry(&Client::new());

        assert_eq!(registry.names(), vec!["google"]);
        assert_eq!(registry.get("google").unwrap().client_secret(), "google-secret");
    }

    #[test]
    fn test_debug_hides_client_secrets() {
        let mut config = google_only();
        config.github_client_id = "github-id".to_string();
        config.github_client_secret = "github-secret".to_string();

        let output = format!("{config:?}");
        assert!(output.contains("google-id"));
        assert!(output.contains("github-id"));
        assert!(!output.contains("google-secret"));
        assert!(!output.contains("github-secret"));
    }
}
