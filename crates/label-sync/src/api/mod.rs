//! Label API capability and its implementations.

pub mod github;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::label::{Label, RepoRef};

/// Errors returned by a [`LabelApi`] implementation.
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Repository or label does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token missing, expired or lacking scope.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Provider rate limit exhausted.
    #[error("Rate limit exceeded{}", reset_suffix(.reset_at.as_ref()))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// Request rejected by validation (e.g. duplicate name, bad color).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Any other API error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Request URL could not be built from the configured base.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Label operations against a code-hosting platform.
///
/// Calls are awaited one at a time by the reconciler; implementations need not
/// support concurrent use beyond `Send + Sync`.
#[async_trait]
pub trait LabelApi: Send + Sync {
    /// Verify that a repository exists and is visible to the caller.
    async fn get_repo(&self, repo: &RepoRef) -> Result<(), ApiError>;

    /// List every label of a repository.
    async fn list_labels(&self, repo: &RepoRef) -> Result<Vec<Label>, ApiError>;

    /// Fetch one label by name.
    async fn get_label(&self, repo: &RepoRef, name: &str) -> Result<Label, ApiError>;

    /// Create a label.
    async fn create_label(&self, repo: &RepoRef, label: &Label) -> Result<(), ApiError>;

    /// Overwrite the label currently named `current_name` with `label`.
    async fn edit_label(
        &self,
        repo: &RepoRef,
        current_name: &str,
        label: &Label,
    ) -> Result<(), ApiError>;

    /// Delete a label by name.
    ///
    /// Backends differ on a label that is already gone: `GitHubLabels`
    /// returns `Ok(())` on a 404, `InMemoryLabels` returns
    /// [`ApiError::NotFound`].
    async fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<(), ApiError>;
}

fn reset_suffix(reset_at: Option<&DateTime<Utc>>) -> String {
    reset_at.map(|t| format!(", resets at {t}")).unwrap_or_default()
}
