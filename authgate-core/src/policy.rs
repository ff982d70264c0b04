use crate::claims::SubjectId;
use async_trait::async_trait;
use thiserror::Error;

/// Errors a policy decider may report. The gate treats all of them as a denial.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy engine unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid policy response: {0}")]
    InvalidResponse(String),
}

/// Optional authorization step applied after the session checks pass.
#[async_trait]
pub trait PolicyDecider: Send + Sync {
    /// Whether `subject` may perform `action` on `object`.
    async fn decide(
        &self,
        subject: &SubjectId,
        object: &str,
        action: &str,
    ) -> Result<bool, PolicyError>;
}
