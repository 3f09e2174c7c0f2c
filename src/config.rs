// src/config.rs
use reqwest::Url;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;

use crate::errors::{HarnessError, Result};

pub const API_URL_VAR: &str = "EVAL_API_URL";
pub const API_KEY_VAR: &str = "EVAL_API_KEY";

/// Header the evaluation endpoint reads the key from.
pub const AUTH_HEADER: &str = "x-functions-key";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where to send the payload and how to authenticate.
#[derive(Clone)]
pub struct EndpointConfig {
    pub url: Url,
    auth_key: SecretString,
}

impl EndpointConfig {
    /// Validates the URL and key. Neither may be empty; the URL must be http(s)
    /// and the key must be usable as a header value.
    pub fn new(url: &str, auth_key: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(HarnessError::Config(format!("{} must not be empty", API_URL_VAR)));
        }
        if auth_key.is_empty() {
            return Err(HarnessError::Config(format!("{} must not be empty", API_KEY_VAR)));
        }

        let parsed = Url::parse(url)
            .map_err(|e| HarnessError::Config(format!("{} is not a valid URL: {}", API_URL_VAR, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HarnessError::Config(format!(
                "{} must use http or https, got '{}'",
                API_URL_VAR,
                parsed.scheme()
            )));
        }

        if HeaderValue::from_str(auth_key).is_err() {
            return Err(HarnessError::Config(format!(
                "{} contains characters that are not allowed in an HTTP header",
                API_KEY_VAR
            )));
        }

        Ok(Self { url: parsed, auth_key: SecretString::from(auth_key.to_string()) })
    }

    /// Resolves the endpoint through `lookup`, which maps a variable name to its value.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let url = get(API_URL_VAR);
        let key = get(API_KEY_VAR);

        match (url, key) {
            (Some(url), Some(key)) => Self::new(&url, &key),
            (url, key) => {
                let missing: Vec<&str> = [(API_URL_VAR, url.is_none()), (API_KEY_VAR, key.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                Err(HarnessError::Config(format!(
                    "{} must be set (missing: {})",
                    [API_URL_VAR, API_KEY_VAR].join(" and "),
                    missing.join(", ")
                )))
            }
        }
    }

    pub fn auth_key(&self) -> &SecretString {
        &self.auth_key
    }

    /// The key with everything past its first four characters masked.
    pub fn redacted_key(&self) -> String {
        redact(self.auth_key.expose_secret())
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url.as_str())
            .field("auth_key", &self.redacted_key())
            .finish()
    }
}

pub(crate) fn redact(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "***".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}***", prefix)
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Upper bound on the whole request; `None` waits for the transport.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
