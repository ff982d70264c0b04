use confique::Config;
use serde_json::Value;
use std::collections::HashMap;

/// Static user directory mapping emails to local subjects
#[derive(Debug, Config, Clone)]
pub struct UsersConfig {
    /// Comma-separated `email=subject` pairs, e.g. "a@x.com=42,b@x.com=bob"
    #[config(env = "AUTHGATE_USERS_DIRECTORY", default = "")]
    pub directory: String,

    /// Let unknown emails log in with the email as their subject (default: false)
    #[config(env = "AUTHGATE_USERS_ALLOW_UNKNOWN", default = false)]
    pub allow_unknown: bool,
}

impl UsersConfig {
    /// Parses the directory. Numeric subjects become JSON numbers.
    pub fn entries(&self) -> Result<HashMap<String, Value>, String> {
        self.directory
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (email, subject) = entry
                    .split_once('=')
                    .map(|(e, s)| (e.trim(), s.trim()))
                    .filter(|(e, s)| !e.is_empty() && !s.is_empty())
                    .ok_or_else(|| format!("invalid user directory entry '{entry}'"))?;

                let subject = match subject.parse::<i64>() {
                    Ok(n) => Value::from(n),
                    Err(_) => Value::from(subject),
                };
                Ok((email.to_ascii_lowercase(), subject))
            })
            .collect()
    }
}
