use crate::oauth::{send_json, Endpoint, Provider, ProviderError, UserInfo};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &[&str] = &["https://www.googleapis.com/auth/userinfo.email"];

#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    #[serde(default)]
    email: String,
}

/// Google identity provider.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    endpoint: Endpoint,
    user_info_url: String,
    http_client: Client,
}

impl GoogleProvider {
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
impl Provider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
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
        let user: GoogleUser =
            send_json(self.http_client.get(&self.user_info_url).bearer_auth(access_token)).await?;

        Ok(UserInfo {
            external_id: user.id,
            email: user.email,
        })
    }
}
