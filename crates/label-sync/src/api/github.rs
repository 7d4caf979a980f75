//! # GitHub Label API Client
//!
//! REST implementation of [`LabelApi`] against `api.github.com` or a GitHub
//! Enterprise endpoint.
//! API Documentation: <https://docs.github.com/en/rest/issues/labels>

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{ApiError, LabelApi};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::label::{Label, RepoRef};

/// Page size for label listing (GitHub maximum).
const PER_PAGE: usize = 100;

const API_VERSION: &str = "2022-11-28";

/// GitHub REST client for repository labels.
#[derive(Clone)]
pub struct GitHubLabels {
    http_client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct GitHubError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    full_name: String,
}

#[derive(Debug, Serialize)]
struct CreateLabelRequest<'a> {
    name: &'a str,
    color: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct EditLabelRequest<'a> {
    new_name: &'a str,
    color: &'a str,
    description: &'a str,
}

impl GitHubLabels {
    /// Create a client from connection settings.
    ///
    /// # Errors
    /// Returns `SyncError::Config` if the token is not a valid header value or
    /// the HTTP client cannot be built.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token()))
            .map_err(|e| SyncError::Config(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );

        let http_client = Client::builder()
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.api_url().clone(),
        })
    }

    /// Build `{base}/repos/{owner}/{repo}/{extra...}` with every segment
    /// percent-encoded, so label names containing `/`, `%` or spaces survive.
    fn endpoint(&self, repo: &RepoRef, extra: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["repos", repo.owner.as_str(), repo.name.as_str()])
            .extend(extra);
        Ok(url)
    }

    /// Send a request and turn non-success statuses into [`ApiError`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let Some(err) = rate_limit_error(&response) {
            warn!(status = %status, error = %err, "GitHub rate limit exhausted");
            return Err(err);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubError>(&text)
            .map(|e| e.message)
            .unwrap_or(text);

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { reset_at: None },
            StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Send a request and decode the JSON body.
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            ApiError::Serialization(e)
        })
    }
}

/// `RateLimited` if the response reports an exhausted quota.
fn rate_limit_error(response: &Response) -> Option<ApiError> {
    let status = response.status();
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let remaining = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())?;
    if remaining > 0 {
        return None;
    }

    let reset_at = response
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Some(ApiError::RateLimited { reset_at })
}

#[async_trait]
impl LabelApi for GitHubLabels {
    #[instrument(skip(self), fields(repo = %repo))]
    async fn get_repo(&self, repo: &RepoRef) -> Result<(), ApiError> {
        let url = self.endpoint(repo, &[])?;
        let found: GitHubRepo = self.send_json(self.http_client.get(url)).await?;
        debug!(full_name = %found.full_name, "Resolved repository");
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_labels(&self, repo: &RepoRef) -> Result<Vec<Label>, ApiError> {
        let mut labels = Vec::new();
        let mut page = 1_usize;

        loop {
            let mut url = self.endpoint(repo, &["labels"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<Label> = self.send_json(self.http_client.get(url)).await?;
            let count = batch.len();
            labels.extend(batch);

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!("Retrieved {} labels", labels.len());
        Ok(labels)
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn get_label(&self, repo: &RepoRef, name: &str) -> Result<Label, ApiError> {
        let url = self.endpoint(repo, &["labels", name])?;
        self.send_json(self.http_client.get(url)).await
    }

    #[instrument(skip(self, label), fields(repo = %repo, label = %label.name))]
    async fn create_label(&self, repo: &RepoRef, label: &Label) -> Result<(), ApiError> {
        let url = self.endpoint(repo, &["labels"])?;
        let body = CreateLabelRequest {
            name: &label.name,
            color: &label.color,
            description: label.description.as_deref(),
        };
        self.send(self.http_client.post(url).json(&body)).await?;
        debug!("Created label");
        Ok(())
    }

    #[instrument(skip(self, label), fields(repo = %repo, label = %current_name))]
    async fn edit_label(
        &self,
        repo: &RepoRef,
        current_name: &str,
        label: &Label,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(repo, &["labels", current_name])?;
        let body = EditLabelRequest {
            new_name: &label.name,
            color: &label.color,
            description: label.description.as_deref().unwrap_or_default(),
        };
        self.send(self.http_client.patch(url).json(&body)).await?;
        debug!("Updated label");
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<(), ApiError> {
        let url = self.endpoint(repo, &["labels", name])?;
        match self.send(self.http_client.delete(url)).await {
            Ok(_) => {
                debug!("Deleted label '{}'", name);
                Ok(())
            }
            Err(ApiError::NotFound(_)) => {
                // Already gone, which is what deletion wants
                debug!("Label '{}' not found (already deleted)", name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
