use crate::error::AuthError;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use http::header::COOKIE;
use http::HeaderMap;
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::Duration;

/// Cookie holding the anti-forgery state between redirect and callback.
pub const ANTI_FORGERY_COOKIE: &str = "externalLoginAntiForgery";
/// Lifetime of the anti-forgery cookie.
pub const STATE_EXPIRY: Duration = Duration::from_secs(2 * 60);

const STATE_BYTES: usize = 16;

/// Single-use random value binding a callback to the browser that started the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiForgeryState(String);

impl AntiForgeryState {
    /// Draws 16 bytes from the OS random source, URL-safe base64 encoded.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; STATE_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::RandomSource(e.to_string()))?;
        Ok(Self(URL_SAFE.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Set-Cookie` value storing this state in the browser.
    pub fn set_cookie(&self, secure: bool) -> String {
        cookie_attributes(&self.0, STATE_EXPIRY.as_secs(), secure)
    }
}

/// `Set-Cookie` value removing the anti-forgery cookie.
pub fn clear_cookie(secure: bool) -> String {
    cookie_attributes("", 0, secure)
}

fn cookie_attributes(value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie =
        format!("{ANTI_FORGERY_COOKIE}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Reads the anti-forgery state from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ANTI_FORGERY_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
