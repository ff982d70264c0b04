//! Per-request authorization decision.

use crate::claims::{Claims, SubjectId, SUB, UUID};
use crate::error::AuthError;
use crate::policy::PolicyDecider;
use crate::session::SessionManager;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use log::{debug, warn};
use std::sync::Arc;

/// Outcome of a successful authorization check.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorized {
    pub subject: SubjectId,
    pub claims: Claims,
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// The header must split on single spaces into exactly two fields, the
/// scheme must be `Bearer` (case-sensitive) and the token must not be blank.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingOrMalformedHeader)?
        .to_str()
        .map_err(|_| AuthError::MissingOrMalformedHeader)?;

    let mut fields = value.split(' ');
    match (fields.next(), fields.next(), fields.next()) {
        (Some("Bearer"), Some(token), None) if !token.trim().is_empty() => Ok(token),
        _ => Err(AuthError::MissingOrMalformedHeader),
    }
}

/// Decides whether a request carries a live, internally consistent session.
///
/// A check performs store reads only. It never writes or mutates tokens, so
/// it may run concurrently and repeatedly for the same token.
#[derive(Clone)]
pub struct Gate {
    sessions: Arc<SessionManager>,
}

impl Gate {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Runs the session checks against the request's bearer token.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<Authorized, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.sessions.extract_access_claims(token)?;

        let subject = claims.subject().ok_or(AuthError::MalformedClaims(SUB))?;
        let token_uuid = claims.uuid().ok_or(AuthError::MalformedClaims(UUID))?;

        // The record is the liveness check: a revoked or expired session has none.
        let record = self.sessions.load_record(token_uuid).await?;
        if record.subject()? != subject {
            warn!(
                "Token subject '{}' does not own session record {}",
                subject, token_uuid
            );
            return Err(AuthError::SubjectMismatch);
        }

        debug!("Authorized subject '{}'", subject);
        Ok(Authorized { subject, claims })
    }

    /// Runs [`Gate::authorize`] and then asks the policy decider.
    ///
    /// A `false` decision and a decider error are both `PolicyDenied`.
    pub async fn authorize_with_policy(
        &self,
        headers: &HeaderMap,
        object: &str,
        action: &str,
        policy: &dyn PolicyDecider,
    ) -> Result<Authorized, AuthError> {
        let authorized = self.authorize(headers).await?;

        match policy.decide(&authorized.subject, object, action).await {
            Ok(true) => Ok(authorized),
            Ok(false) => {
                debug!(
                    "Policy denied '{}' {} on '{}'",
                    authorized.subject, action, object
                );
                Err(AuthError::PolicyDenied)
            }
            Err(e) => {
                warn!("Policy decision failed, denying request: {}", e);
                Err(AuthError::PolicyDenied)
            }
        }
    }

    /// Validated access claims of the request, without the liveness check.
    pub fn claims_from_request(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = bearer_token(headers)?;
        self.sessions.extract_access_claims(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JwtCodec, TokenCodec};
    use crate::policy::PolicyError;
    use crate::test_utils::{session_manager, test_settings, MemoryStore};
    use async_trait::async_trait;
    use http::HeaderValue;
    use serde_json::json;
    use std::sync::Mutex;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn raw_header(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    struct StaticPolicy {
        result: Result<bool, String>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl StaticPolicy {
        fn new(result: Result<bool, String>) -> Self {
            Self {
                result,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PolicyDecider for StaticPolicy {
        async fn decide(
            &self,
            subject: &SubjectId,
            object: &str,
            action: &str,
        ) -> Result<bool, PolicyError> {
            self.calls.lock().unwrap().push((
                subject.to_string(),
                object.to_string(),
                action.to_string(),
            ));
            self.result.clone().map_err(PolicyError::Unavailable)
        }
    }

    #[test]
    fn test_bearer_token_format() {
        assert_eq!(bearer_token(&raw_header("Bearer abc")).unwrap(), "abc");

        for value in [
            "bearer abc",
            "Bearer",
            "Bearer ",
            "Bearer  abc",
            "Bearer abc def",
            "Basic abc",
            "Token abc",
        ] {
            assert!(
                matches!(
                    bearer_token(&raw_header(value)),
                    Err(AuthError::MissingOrMalformedHeader)
                ),
                "header '{value}' should be rejected"
            );
        }

        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingOrMalformedHeader)
        ));
    }

    #[tokio::test]
    async fn test_session_lifecycle_scenario() {
        let sessions = session_manager(MemoryStore::new());
        let gate = Gate::new(sessions.clone());

        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();

        let authorized = gate.authorize(&bearer(&pair.access_token)).await.unwrap();
        assert_eq!(authorized.subject.as_str(), "42");
        assert_eq!(authorized.claims.email(), Some("a@x.com"));

        sessions.destroy_session(&pair.access_token).await.unwrap();

        assert!(matches!(
            gate.authorize(&bearer(&pair.access_token)).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_authorize_is_repeatable() {
        let store = MemoryStore::new();
        let sessions = session_manager(store.clone());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject("user-1", "a@x.com"))
            .await
            .unwrap();

        let headers = bearer(&pair.access_token);
        let (first, second) = tokio::join!(gate.authorize(&headers), gate.authorize(&headers));
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(store.len(), 2);
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_store_read_failure() {
        let store = MemoryStore::new();
        let sessions = session_manager(store.clone());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();

        store.fail_reads(true);
        let result = gate.authorize(&bearer(&pair.access_token)).await;
        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
        assert!(!result.unwrap_err().is_rejection());

        store.fail_reads(false);
        assert!(gate.authorize(&bearer(&pair.access_token)).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let sessions = session_manager(MemoryStore::new());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();

        assert!(matches!(
            gate.authorize(&bearer(&pair.refresh_token)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_subject_mismatch() {
        let store = MemoryStore::new();
        let sessions = session_manager(store.clone());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();

        let record = json!({"sub": 7, "refresh_token_uuid": pair.refresh_uuid});
        store.insert_raw(&pair.access_uuid, record.to_string().as_bytes());

        assert!(matches!(
            gate.authorize(&bearer(&pair.access_token)).await,
            Err(AuthError::SubjectMismatch)
        ));
    }

    #[tokio::test]
    async fn test_numeric_subject_compared_by_value() {
        let store = MemoryStore::new();
        let sessions = session_manager(store.clone());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();

        let record = json!({"sub": 42.0, "refresh_token_uuid": pair.refresh_uuid});
        store.insert_raw(&pair.access_uuid, record.to_string().as_bytes());

        let authorized = gate.authorize(&bearer(&pair.access_token)).await.unwrap();
        assert_eq!(authorized.subject, SubjectId::from("42"));
    }

    #[tokio::test]
    async fn test_record_without_subject_is_corrupt() {
        let store = MemoryStore::new();
        let sessions = session_manager(store.clone());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();

        let record = json!({"refresh_token_uuid": pair.refresh_uuid});
        store.insert_raw(&pair.access_uuid, record.to_string().as_bytes());

        assert!(matches!(
            gate.authorize(&bearer(&pair.access_token)).await,
            Err(AuthError::CorruptRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_token_missing_uuid() {
        let sessions = session_manager(MemoryStore::new());
        let gate = Gate::new(sessions);
        let settings = test_settings();
        let token = JwtCodec::default()
            .sign(
                &Claims::for_subject(42, "a@x.com"),
                &settings.access_secret,
                settings.access_ttl,
            )
            .unwrap();

        assert!(matches!(
            gate.authorize(&bearer(&token)).await,
            Err(AuthError::MalformedClaims("uuid"))
        ));
        // Claims alone still validate
        assert!(gate.claims_from_request(&bearer(&token)).is_ok());
    }

    #[tokio::test]
    async fn test_forged_token() {
        let gate = Gate::new(session_manager(MemoryStore::new()));
        let mut claims = Claims::for_subject(42, "a@x.com");
        claims.insert(UUID, "forged");
        let token = JwtCodec::default()
            .sign(&claims, b"attacker-secret", std::time::Duration::from_secs(60))
            .unwrap();

        assert!(matches!(
            gate.authorize(&bearer(&token)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_policy_allows_and_denies() {
        let sessions = session_manager(MemoryStore::new());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();
        let headers = bearer(&pair.access_token);

        let allow = StaticPolicy::new(Ok(true));
        let authorized = gate
            .authorize_with_policy(&headers, "res", "read", &allow)
            .await
            .unwrap();
        assert_eq!(authorized.subject.as_str(), "42");
        assert_eq!(
            allow.calls.lock().unwrap().as_slice(),
            &[("42".to_string(), "res".to_string(), "read".to_string())]
        );

        let deny = StaticPolicy::new(Ok(false));
        assert!(matches!(
            gate.authorize_with_policy(&headers, "res", "delete", &deny)
                .await,
            Err(AuthError::PolicyDenied)
        ));

        let failing = StaticPolicy::new(Err("engine down".to_string()));
        assert!(matches!(
            gate.authorize_with_policy(&headers, "res", "read", &failing)
                .await,
            Err(AuthError::PolicyDenied)
        ));
    }

    #[tokio::test]
    async fn test_policy_not_consulted_without_session() {
        let gate = Gate::new(session_manager(MemoryStore::new()));
        let policy = StaticPolicy::new(Ok(true));

        let result = gate
            .authorize_with_policy(&raw_header("Bearer nope"), "res", "read", &policy)
            .await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
        assert!(policy.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_logout_then_authorize() {
        let sessions = session_manager(MemoryStore::new());
        let gate = Gate::new(sessions.clone());
        let pair = sessions
            .create_session(&Claims::for_subject(42, "a@x.com"))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            sessions.destroy_session(&pair.access_token),
            sessions.destroy_session(&pair.access_token)
        );
        assert!(a.is_ok() || b.is_ok());

        assert!(matches!(
            gate.authorize(&bearer(&pair.access_token)).await,
            Err(AuthError::SessionNotFound)
        ));
    }
}
