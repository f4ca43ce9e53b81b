//! Client configuration.
//!
//! `ClientConfig` is shared by every postsync front end. Values come from an
//! optional JSON file, then `POSTSYNC_*` environment overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_API_BASE_URL: &str = "https://dummyjson.com";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_AUTHOR_ID: i64 = 1;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RECENT_LIMIT: usize = 5;

const ENV_API_BASE_URL: &str = "POSTSYNC_API_BASE_URL";
const ENV_PAGE_SIZE: &str = "POSTSYNC_PAGE_SIZE";
const ENV_AUTHOR_ID: &str = "POSTSYNC_AUTHOR_ID";
const ENV_HTTP_TIMEOUT_SECS: &str = "POSTSYNC_HTTP_TIMEOUT_SECS";

/// Runtime configuration for the remote store and the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub page_size: usize,
    /// Author recorded on remotely created posts
    pub author_id: i64,
    pub http_timeout_secs: u64,
    /// Size of the dashboard's recent list
    pub recent_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            author_id: DEFAULT_AUTHOR_ID,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()
    }

    /// Apply `POSTSYNC_*` overrides read through `lookup`; blank values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let read = |key: &str| normalize_text_option(lookup(key));

        if let Some(url) = read(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(raw) = read(ENV_PAGE_SIZE) {
            self.page_size = parse_env(ENV_PAGE_SIZE, &raw)?;
        }
        if let Some(raw) = read(ENV_AUTHOR_ID) {
            self.author_id = parse_env(ENV_AUTHOR_ID, &raw)?;
        }
        if let Some(raw) = read(ENV_HTTP_TIMEOUT_SECS) {
            self.http_timeout_secs = parse_env(ENV_HTTP_TIMEOUT_SECS, &raw)?;
        }
        Ok(())
    }

    /// Check ranges and normalize the base URL.
    pub fn validate(mut self) -> Result<Self> {
        let url = normalize_text_option(Some(self.api_base_url))
            .ok_or_else(|| Error::InvalidInput("api_base_url is required".to_string()))?;
        if !is_http_url(&url) {
            return Err(Error::InvalidInput(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
        self.api_base_url = url.trim_end_matches('/').to_string();

        if self.page_size == 0 {
            return Err(Error::InvalidInput(
                "page_size must be at least 1".to_string(),
            ));
        }
        if self.recent_limit == 0 {
            return Err(Error::InvalidInput(
                "recent_limit must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Engine settings derived from this configuration
    pub const fn engine(&self) -> EngineConfig {
        EngineConfig {
            page_size: self.page_size,
            author_id: self.author_id,
            recent_limit: self.recent_limit,
        }
    }
}

/// The subset of [`ClientConfig`] the sync engine consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub page_size: usize,
    pub author_id: i64,
    pub recent_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        ClientConfig::default().engine()
    }
}

/// Parse and validate a JSON config payload.
pub fn parse_client_config(payload: &str) -> Result<ClientConfig> {
    let config: ClientConfig = serde_json::from_str(payload)?;
    config.validate()
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::InvalidInput(format!("{key} has an invalid value: {raw}")))
}
