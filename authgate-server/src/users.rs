use crate::config::users::UsersConfig;
use async_trait::async_trait;
use authgate_core::oauth::ResolveError;
use authgate_core::UserResolver;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

/// Resolves provider emails against a directory loaded at startup.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: HashMap<String, Value>,
    allow_unknown: bool,
}

impl UserDirectory {
    pub fn new(config: &UsersConfig) -> Result<Self, String> {
        Ok(Self {
            users: config.entries()?,
            allow_unknown: config.allow_unknown,
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserResolver for UserDirectory {
    async fn lookup_by_email(&self, email: &str) -> Result<Value, ResolveError> {
        let key = email.trim().to_ascii_lowercase();
        if let Some(subject) = self.users.get(&key) {
            return Ok(subject.clone());
        }
        if self.allow_unknown {
            debug!("Unknown user '{}' logs in under their email", key);
            return Ok(Value::String(key));
        }
        Err(format!("no local user registered for '{key}'").into())
    }
}
