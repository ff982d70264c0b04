use crate::cache::Cache;
use crate::config::oauth::OAuthConfig;
use crate::config::AppConfig;
use crate::opa_client::OpaPolicy;
use crate::users::UserDirectory;
use authgate_core::{
    Gate, JwtCodec, OAuthFlow, PolicyDecider, ProviderRegistry, SessionManager, TokenStore,
};
use log::info;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub gate: Gate,
    pub oauth: Arc<OAuthFlow>,
    /// Present only when policy enforcement is enabled
    pub policy: Option<Arc<dyn PolicyDecider>>,
}

impl AppState {
    /// Client shared by the code exchange and every provider's user-info calls
    pub(crate) fn create_oauth_client(config: &OAuthConfig) -> Result<Client, String> {
        Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(2))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| format!("Failed to create OAuth client: {e}"))
    }

    /// Wires the core components on top of an already initialised token store
    pub fn new(config: &AppConfig, cache: Cache) -> Result<Self, String> {
        let client = Self::create_oauth_client(&config.oauth)?;
        let registry = config.oauth.build_registry(&client);
        Self::with_registry(config, cache, registry, client)
    }

    pub(crate) fn with_registry(
        config: &AppConfig,
        cache: Cache,
        registry: ProviderRegistry,
        oauth_client: Client,
    ) -> Result<Self, String> {
        Url::parse(&config.public_url)
            .map_err(|e| format!("Invalid public URL '{}': {}", config.public_url, e))?;

        let store: Arc<dyn TokenStore> = Arc::new(cache);
        let sessions = Arc::new(SessionManager::new(
            store,
            Arc::new(JwtCodec::default()),
            config.tokens.to_settings(),
        ));

        let users = Arc::new(UserDirectory::new(&config.users)?);
        info!("Loaded {} users from the directory", users.len());

        let oauth = OAuthFlow::new(
            Arc::new(registry),
            sessions.clone(),
            users,
            config.auth_base_url(),
        )
        .with_http_client(oauth_client);

        let policy: Option<Arc<dyn PolicyDecider>> = if config.policy.enabled {
            info!("Policy enforcement enabled: {}", config.policy.decision_url());
            Some(Arc::new(OpaPolicy::new(&config.policy)?))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config.clone()),
            gate: Gate::new(sessions.clone()),
            sessions,
            oauth: Arc::new(oauth),
            policy,
        })
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> Result<(), String> {
        self.sessions.health_check().await
    }
}
