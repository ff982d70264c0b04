//! Claim sets embedded in signed tokens and the subject identity derived from them.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Claim carrying the authenticated subject.
pub const SUB: &str = "sub";
/// Claim carrying the subject's email address.
pub const EMAIL: &str = "email";
/// Per-token identifier, also the key of the token's cross-reference record.
pub const UUID: &str = "uuid";
/// Absolute expiry in unix seconds.
pub const EXP: &str = "exp";

/// Ordered mapping from claim names to JSON values.
///
/// Claims handed to [`crate::SessionManager::create_session`] must carry a
/// usable `sub` and a non-empty `email`. The session manager adds `uuid` and
/// `exp` to each token it signs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the minimal `{sub, email}` claim set used to start a session.
    pub fn for_subject(sub: impl Into<Value>, email: impl Into<String>) -> Self {
        let mut claims = Self::new();
        claims.insert(SUB, sub);
        claims.insert(EMAIL, email.into());
        claims
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw `sub` value, ignoring an explicit `null`.
    pub fn sub(&self) -> Option<&Value> {
        self.0.get(SUB).filter(|v| !v.is_null())
    }

    /// Canonical subject identity, if `sub` is usable as one.
    pub fn subject(&self) -> Option<SubjectId> {
        self.sub().and_then(SubjectId::from_value)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get(EMAIL).and_then(Value::as_str)
    }

    pub fn uuid(&self) -> Option<&str> {
        self.0
            .get(UUID)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn exp(&self) -> Option<i64> {
        self.0.get(EXP).and_then(Value::as_i64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Checks the claims required to start a session.
    pub fn validate_required(&self) -> Result<(), AuthError> {
        if self.subject().is_none() {
            return Err(AuthError::InvalidClaims("missing sub from claims".to_string()));
        }
        match self.email() {
            Some(email) if !email.trim().is_empty() => Ok(()),
            _ => Err(AuthError::InvalidClaims(
                "missing email from claims".to_string(),
            )),
        }
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Claims {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Canonical form of a subject identifier.
///
/// Token codecs and stores may round-trip a numeric `sub` through different
/// JSON representations (`42`, `42.0`), and applications may issue it as a
/// string. Equality is defined on the canonical text: strings are kept
/// verbatim, integral numbers become their decimal integer form and other
/// finite numbers keep their shortest representation. Booleans, null, arrays
/// and objects are not subjects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Some(Self(u.to_string()))
                } else {
                    let f = n.as_f64()?;
                    if !f.is_finite() {
                        None
                    } else if f == 0.0 {
                        Some(Self("0".to_string()))
                    } else if f.fract() == 0.0 {
                        Some(Self(format!("{f:.0}")))
                    } else {
                        Some(Self(f.to_string()))
                    }
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
