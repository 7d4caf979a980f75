//! # Label Sync
//!
//! Synchronize GitHub issue labels from an authoritative source repository to
//! a target repository.
//!
//! This crate provides:
//! - A [`LabelApi`] capability trait with a GitHub REST implementation and an
//!   in-memory implementation
//! - [`SyncPlan`], the create/update/delete partition of two label collections
//! - [`Reconciler`], which resolves both repositories, plans, and applies the
//!   plan against the target while collecting per-label failures
//!
//! ## Example
//!
//! ```rust,ignore
//! use label_sync::{GitHubLabels, Reconciler, RepoRef, SyncConfig, SyncOptions};
//!
//! let config = SyncConfig::new(token)?;
//! let api = GitHubLabels::new(&config)?;
//! let reconciler = Reconciler::new(api);
//!
//! let source: RepoRef = "5dlabs/cto".parse()?;
//! let target: RepoRef = "5dlabs/cto-apps".parse()?;
//! let report = reconciler.sync(&source, &target, SyncOptions::default()).await?;
//! println!("{} failures", report.fails.len());
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod config;
pub mod error;
pub mod label;
pub mod logging;
pub mod plan;
pub mod reconcile;
pub mod report;

pub use api::github::GitHubLabels;
pub use api::memory::InMemoryLabels;
pub use api::{ApiError, LabelApi};
pub use config::SyncConfig;
pub use error::{RepoRole, SyncError, SyncResult};
pub use label::{Label, LabelIndex, RepoRef};
pub use plan::SyncPlan;
pub use reconcile::{PreparedSync, Reconciler, SyncOptions};
pub use report::{FailedAction, LabelAction, SyncReport};
