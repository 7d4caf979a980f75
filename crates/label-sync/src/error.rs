//! Fatal errors for a sync run.
//!
//! Per-label failures never surface here; they are collected in
//! [`SyncReport::fails`](crate::report::SyncReport::fails).

use std::fmt;

use thiserror::Error;

use crate::api::ApiError;

/// Which side of the sync a repository is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoRole {
    Source,
    Destination,
}

impl fmt::Display for RepoRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "Source"),
            Self::Destination => write!(f, "Destination"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No GitHub API token provided (set GITHUB_API_KEY)")]
    MissingCredential,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid repository '{0}': expected owner/name")]
    InvalidRepo(String),

    #[error("{role} repo is not a repo: {repo} ({source})")]
    Resolution {
        role: RepoRole,
        repo: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to list labels of {role} repo {repo}: {source}")]
    Listing {
        role: RepoRole,
        repo: String,
        #[source]
        source: ApiError,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;
