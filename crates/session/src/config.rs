use eyre::{Result, eyre};
use serde::Deserialize;
use std::{env, time::Duration};

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Connection settings for the external session service.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the session service (required)
    pub base_url: String,
    /// Bearer key sent with every request
    pub api_key: Option<String>,
    /// Per-request timeout in seconds (defaults to 10)
    pub request_timeout_seconds: u64,
}

impl SessionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("SESSION_SERVICE_URL")
            .ok_or_else(|| eyre!("SESSION_SERVICE_URL environment variable not set"))?
            .trim_end_matches('/')
            .to_string();

        let api_key = lookup("SESSION_SERVICE_KEY").filter(|key| !key.is_empty());

        let request_timeout_seconds = match lookup("SESSION_REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| eyre!("SESSION_REQUEST_TIMEOUT_SECONDS must be a valid u64"))?,
            None => DEFAULT_TIMEOUT_SECONDS,
        };

        Ok(Self {
            base_url,
            api_key,
            request_timeout_seconds,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
