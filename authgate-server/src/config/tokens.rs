use authgate_core::session::random_secret;
use authgate_core::TokenSettings;
use confique::Config;
use log::warn;
use std::fmt;
use std::time::Duration;

const GENERATED_SECRET_LEN: usize = 32;

/// Token signing configuration
#[derive(Config, Clone)]
pub struct TokensConfig {
    /// Secret for signing access tokens (default: random per process)
    #[config(env = "AUTHGATE_TOKENS_ACCESS_SECRET", default = "")]
    pub access_secret: String,

    /// Access token lifetime in seconds (default: 900 = 15 minutes)
    #[config(env = "AUTHGATE_TOKENS_ACCESS_TTL", default = 900)]
    pub access_ttl: u64,

    /// Secret for signing refresh tokens (default: random per process)
    #[config(env = "AUTHGATE_TOKENS_REFRESH_SECRET", default = "")]
    pub refresh_secret: String,

    /// Refresh token lifetime in seconds (default: 604800 = 7 days)
    #[config(env = "AUTHGATE_TOKENS_REFRESH_TTL", default = 604800)]
    pub refresh_ttl: u64,
}

impl fmt::Debug for TokensConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokensConfig")
            .field("access_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_secret", &"<redacted>")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokensConfig {
    /// Builds the session settings, generating any secret left empty.
    ///
    /// Generated secrets only live as long as the process, so every issued
    /// token becomes invalid on restart.
    pub fn to_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: secret_or_random(&self.access_secret, "access"),
            access_ttl: Duration::from_secs(self.access_ttl),
            refresh_secret: secret_or_random(&self.refresh_secret, "refresh"),
            refresh_ttl: Duration::from_secs(self.refresh_ttl),
        }
    }
}

fn secret_or_random(secret: &str, kind: &str) -> Vec<u8> {
    if secret.is_empty() {
        warn!(
            "No {} token secret configured, generating a random one for this process",
            kind
        );
        random_secret(GENERATED_SECRET_LEN)
    } else {
        secret.as_bytes().to_vec()
    }
}
