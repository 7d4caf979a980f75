//! Connection settings for the GitHub label API.
//!
//! The library never reads the process environment; the CLI resolves the
//! token and API URL (flags or `GITHUB_API_KEY` / `GITHUB_API_URL`) and hands
//! them over as a [`SyncConfig`].

use std::time::Duration;

use reqwest::Url;

use crate::error::{SyncError, SyncResult};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_USER_AGENT: &str = concat!("sync-labels/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct SyncConfig {
    token: String,
    api_url: Url,
    user_agent: String,
    timeout: Duration,
}

impl SyncConfig {
    /// Create a configuration for the public GitHub API.
    ///
    /// # Errors
    /// Returns `SyncError::MissingCredential` if the token is empty.
    pub fn new(token: impl Into<String>) -> SyncResult<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(SyncError::MissingCredential);
        }

        Ok(Self {
            token,
            api_url: Url::parse(DEFAULT_API_URL)
                .map_err(|e| SyncError::Config(format!("default API URL: {e}")))?,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Build from an optional token, as handed over by the CLI layer.
    pub fn from_token(token: Option<String>) -> SyncResult<Self> {
        token.map_or(Err(SyncError::MissingCredential), Self::new)
    }

    /// Point the client at a different API root (GitHub Enterprise, tests).
    ///
    /// # Errors
    /// Returns `SyncError::Config` if the URL does not parse or cannot be a base.
    pub fn with_api_url(mut self, api_url: &str) -> SyncResult<Self> {
        let url = Url::parse(api_url.trim())
            .map_err(|e| SyncError::Config(format!("invalid API URL '{api_url}': {e}")))?;
        if url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "API URL '{api_url}' cannot be used as a base"
            )));
        }
        self.api_url = url;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}
