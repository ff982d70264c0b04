use confique::Config;

/// Configuration for the OPA policy decider
#[derive(Debug, Config, Clone)]
pub struct PolicyConfig {
    /// Enforce policy decisions on resource routes (default: false)
    #[config(env = "AUTHGATE_POLICY_ENABLED", default = false)]
    pub enabled: bool,

    /// The URL of the OPA service (default: http://localhost:8181)
    #[config(env = "AUTHGATE_POLICY_OPA_URL", default = "http://localhost:8181")]
    pub opa_url: String,

    /// Path of the boolean decision document
    #[config(
        env = "AUTHGATE_POLICY_DECISION_PATH",
        default = "/v1/data/authgate/allow"
    )]
    pub decision_path: String,

    /// The timeout for OPA queries in seconds (default: 1)
    #[config(env = "AUTHGATE_POLICY_QUERY_TIMEOUT", default = 1)]
    pub query_timeout: u64,
}

impl PolicyConfig {
    /// Full URL of the decision document
    pub fn decision_url(&self) -> String {
        let path = self.decision_path.strip_prefix('/').unwrap_or(&self.decision_path);
        format!("{}/{}", self.opa_url.trim_end_matches('/'), path)
    }
}
