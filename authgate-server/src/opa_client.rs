//! OPA-backed policy decisions.

use crate::config::policy::PolicyConfig;
use async_trait::async_trait;
use authgate_core::{PolicyDecider, PolicyError, SubjectId};
use http::StatusCode;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// A generic wrapper for OPA requests, wrapping the input data.
/// https://www.openpolicyagent.org/docs/latest/integration/#named-policy-decisions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpaRequest<T> {
    pub input: T,
}

/// A generic wrapper for OPA responses, wrapping the result data.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpaResponse<T> {
    pub result: T,
}

/// Input document of a decision query
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DecisionInput {
    pub subject: String,
    pub object: String,
    pub action: String,
}

/// Errors that can occur when querying OPA
#[derive(Debug, Error)]
pub enum ForwardingError {
    #[error("Failed to send request to OPA: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("OPA request failed with status: {0}")]
    InvalidStatus(StatusCode),
    #[error("Failed to parse OPA response: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("OPA decision is not a boolean: {0}")]
    NotABoolean(Value),
}

impl From<ForwardingError> for PolicyError {
    fn from(err: ForwardingError) -> Self {
        match err {
            ForwardingError::RequestError(_) | ForwardingError::InvalidStatus(_) => {
                PolicyError::Unavailable(err.to_string())
            }
            ForwardingError::ParseError(_) | ForwardingError::NotABoolean(_) => {
                PolicyError::InvalidResponse(err.to_string())
            }
        }
    }
}

/// Asks OPA whether a subject may perform an action on an object.
#[derive(Clone)]
pub struct OpaPolicy {
    client: Client,
    decision_url: String,
}

impl OpaPolicy {
    pub fn new(config: &PolicyConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.query_timeout))
            .connect_timeout(Duration::from_secs(2))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| format!("Failed to create OPA client: {e}"))?;

        Ok(Self {
            client,
            decision_url: config.decision_url(),
        })
    }

    async fn query(&self, input: &DecisionInput) -> Result<bool, ForwardingError> {
        debug!("Querying OPA decision at: {}", self.decision_url);
        let response = self
            .client
            .post(&self.decision_url)
            .json(&OpaRequest { input })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ForwardingError::InvalidStatus(response.status()));
        }

        let body = response.bytes().await?;
        let response: OpaResponse<Value> = serde_json::from_slice(&body)?;
        decision_from(response.result)
    }
}

/// Accepts `true`/`false` or an object carrying an `allow` boolean.
fn decision_from(result: Value) -> Result<bool, ForwardingError> {
    let allow = match &result {
        Value::Bool(allow) => Some(*allow),
        Value::Object(obj) => obj.get("allow").and_then(Value::as_bool),
        _ => None,
    };
    allow.ok_or(ForwardingError::NotABoolean(result))
}

#[async_trait]
impl PolicyDecider for OpaPolicy {
    async fn decide(
        &self,
        subject: &SubjectId,
        object: &str,
        action: &str,
    ) -> Result<bool, PolicyError> {
        let input = DecisionInput {
            subject: subject.to_string(),
            object: object.to_string(),
            action: action.to_string(),
        };
        Ok(self.query(&input).await?)
    }
}
