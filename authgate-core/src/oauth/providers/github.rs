use crate::oauth::{send_json, Endpoint, Provider, ProviderError, UserInfo};
use async_trait::async_trait;
use http::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;

const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_INFO_URL: &str = "https://api.github.com/user";
const SCOPES: &[&str] = &["user:email"];

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    // null when the user keeps their address private
    #[serde(default)]
    email: Option<String>,
}

/// GitHub identity provider.
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    client_id: String,
    client_secret: String,
    endpoint: Endpoint,
    user_info_url: String,
    http_client: Client,
}

impl GitHubProvider {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            endpoint: Endpoint::new(AUTH_URL, TOKEN_URL),
            user_info_url: USER_INFO_URL.to_string(),
            http_client: Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_user_info_url(mut self, url: impl Into<String>) -> Self {
        self.user_info_url = url.into();
        self
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn scopes(&self) -> &[&str] {
        SCOPES
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn client_secret(&self) -> &str {
        &self.client_secret
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo, ProviderError> {
        // The GitHub API rejects requests without a User-Agent
        let request = self
            .http_client
            .get(&self.user_info_url)
            .header(AUTHORIZATION, format!("token {access_token}"))
            .header(USER_AGENT, concat!("authgate/", env!("CARGO_PKG_VERSION")));
        let user: GitHubUser = send_json(request).await?;

        Ok(UserInfo {
            external_id: user.id.to_string(),
            email: user.email.unwrap_or_default(),
        })
    }
}
