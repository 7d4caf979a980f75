//! # Label Reconciler
//!
//! Brings the destination repository's labels in line with the source:
//!
//! 1. Resolve both repositories (fatal on failure)
//! 2. List both label collections and compute a [`SyncPlan`]
//! 3. Create, update, then delete labels one call at a time, recording
//!    per-label failures in the [`SyncReport`] instead of aborting

use tracing::{info, instrument, warn};

use crate::api::{ApiError, LabelApi};
use crate::error::{RepoRole, SyncError, SyncResult};
use crate::label::{index_labels, LabelIndex, RepoRef};
use crate::plan::SyncPlan;
use crate::report::{LabelAction, SyncReport};

/// Switches for a sync run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Report what would happen without mutating the destination.
    pub dry_run: bool,
    /// Delete destination labels that are not in the source.
    pub delete: bool,
}

/// Both label collections and the plan derived from them.
#[derive(Debug, Clone)]
pub struct PreparedSync {
    pub source: RepoRef,
    pub destination: RepoRef,
    pub source_labels: LabelIndex,
    pub destination_labels: LabelIndex,
    pub plan: SyncPlan,
}

pub struct Reconciler<A> {
    api: A,
}

impl<A: LabelApi> Reconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Resolve, list and plan. Nothing is mutated.
    ///
    /// # Errors
    /// Returns `SyncError::Resolution` if either repository does not resolve
    /// (including rate limiting) and `SyncError::Listing` if its labels cannot
    /// be read.
    #[instrument(skip(self), fields(source = %source, destination = %destination))]
    pub async fn prepare(
        &self,
        source: &RepoRef,
        destination: &RepoRef,
        delete_enabled: bool,
    ) -> SyncResult<PreparedSync> {
        info!("Syncing labels from {source} to {destination}");

        self.resolve(source, RepoRole::Source).await?;
        self.resolve(destination, RepoRole::Destination).await?;

        let source_labels = self.list(source, RepoRole::Source).await?;
        let destination_labels = self.list(destination, RepoRole::Destination).await?;

        let plan = SyncPlan::compute(&source_labels, &destination_labels, delete_enabled);
        log_plan(&plan, destination, delete_enabled);

        Ok(PreparedSync {
            source: source.clone(),
            destination: destination.clone(),
            source_labels,
            destination_labels,
            plan,
        })
    }

    /// Execute a plan against the destination.
    ///
    /// Never fails as a whole: every per-label error lands in
    /// [`SyncReport::fails`] and the remaining labels are still processed.
    #[instrument(
        skip(self, prepared),
        fields(source = %prepared.source, destination = %prepared.destination)
    )]
    pub async fn apply(&self, prepared: &PreparedSync, dry_run: bool) -> SyncReport {
        let destination = &prepared.destination;
        let mut report = SyncReport::new(
            prepared.source.to_string(),
            destination.to_string(),
            dry_run,
        );

        let phases = [
            (LabelAction::Create, &prepared.plan.to_create),
            (LabelAction::Update, &prepared.plan.to_update),
            (LabelAction::Delete, &prepared.plan.to_delete),
        ];

        for (action, names) in phases {
            for name in names {
                match action {
                    LabelAction::Create => {
                        info!("Creating label {name} in destination repo {destination}...");
                    }
                    LabelAction::Update => {
                        info!("Updating label {name} in destination repo {destination}...");
                    }
                    LabelAction::Delete => {
                        info!("Removing label {name} from destination repo {destination}...");
                    }
                }

                if dry_run {
                    info!("Dry run successful!");
                    report.record_success(action, name);
                    continue;
                }

                match self.execute(prepared, action, name).await {
                    Ok(()) => {
                        info!("Success!");
                        report.record_success(action, name);
                    }
                    Err(e) => {
                        warn!(error = %e, "Error trying to {action} label {name} in destination repo {destination}");
                        report.record_failure(action, name, e.to_string());
                    }
                }
            }
        }

        info!("Done.");
        if !report.fails.is_empty() {
            warn!("{} label action(s) failed:", report.fails.len());
            for fail in &report.fails {
                warn!(" - {} {}: {}", fail.action, fail.name, fail.error);
            }
        }

        report
    }

    /// `prepare` followed by `apply`, without any confirmation step.
    pub async fn sync(
        &self,
        source: &RepoRef,
        destination: &RepoRef,
        options: SyncOptions,
    ) -> SyncResult<SyncReport> {
        let prepared = self.prepare(source, destination, options.delete).await?;
        Ok(self.apply(&prepared, options.dry_run).await)
    }

    async fn resolve(&self, repo: &RepoRef, role: RepoRole) -> SyncResult<()> {
        self.api
            .get_repo(repo)
            .await
            .map_err(|source| SyncError::Resolution {
                role,
                repo: repo.to_string(),
                source,
            })
    }

    async fn list(&self, repo: &RepoRef, role: RepoRole) -> SyncResult<LabelIndex> {
        let labels = self
            .api
            .list_labels(repo)
            .await
            .map_err(|source| SyncError::Listing {
                role,
                repo: repo.to_string(),
                source,
            })?;
        Ok(index_labels(labels))
    }

    /// One label action. Create and update re-read the label from the source
    /// so the latest color and description are written.
    async fn execute(
        &self,
        prepared: &PreparedSync,
        action: LabelAction,
        name: &str,
    ) -> Result<(), ApiError> {
        match action {
            LabelAction::Create => {
                let label = self.api.get_label(&prepared.source, name).await?;
                self.api.create_label(&prepared.destination, &label).await
            }
            LabelAction::Update => {
                let label = self.api.get_label(&prepared.source, name).await?;
                self.api
                    .edit_label(&prepared.destination, name, &label)
                    .await
            }
            LabelAction::Delete => self.api.delete_label(&prepared.destination, name).await,
        }
    }
}

fn log_plan(plan: &SyncPlan, destination: &RepoRef, delete_enabled: bool) {
    info!("The following labels will be created in {destination}:");
    for name in &plan.to_create {
        info!(" - {name}");
    }

    info!("The following labels will be updated in {destination}:");
    for name in &plan.to_update {
        info!(" - {name}");
    }

    if delete_enabled {
        info!("The following labels will be deleted in {destination}:");
        for name in &plan.to_delete {
            info!(" - {name}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::InMemoryLabels;
    use crate::label::Label;

    fn source() -> RepoRef {
        RepoRef::new("octo", "source")
    }

    fn destination() -> RepoRef {
        RepoRef::new("octo", "destination")
    }

    /// Source {bug(red,"bug"), feature(green,"")}, destination
    /// {bug(blue), stale(gray)}.
    fn scenario() -> InMemoryLabels {
        InMemoryLabels::new()
            .with_repo(
                &source(),
                vec![
                    Label::new("bug", "ff0000").with_description("bug"),
                    Label::new("feature", "00ff00").with_description(""),
                ],
            )
            .with_repo(
                &destination(),
                vec![Label::new("bug", "0000ff"), Label::new("stale", "808080")],
            )
    }

    fn names(api: &InMemoryLabels, repo: &RepoRef) -> Vec<String> {
        api.labels(repo)
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect()
    }

    #[tokio::test]
    async fn test_sync_without_delete() {
        let api = scenario();
        let reconciler = Reconciler::new(api.clone());

        let report = reconciler
            .sync(&source(), &destination(), SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(report.created, vec!["feature"]);
        assert_eq!(report.updated, vec!["bug"]);
        assert!(report.deleted.is_empty());
        assert!(report.is_success());

        let labels = api.labels(&destination()).unwrap();
        let bug = labels.iter().find(|l| l.name == "bug").unwrap();
        assert_eq!(bug.color, "ff0000");
        assert_eq!(bug.description.as_deref(), Some("bug"));
        assert_eq!(names(&api, &destination()), vec!["bug", "feature", "stale"]);
    }

    #[tokio::test]
    async fn test_sync_with_delete() {
        let api = scenario();
        let reconciler = Reconciler::new(api.clone());

        let options = SyncOptions {
            dry_run: false,
            delete: true,
        };
        let report = reconciler
            .sync(&source(), &destination(), options)
            .await
            .unwrap();

        assert_eq!(report.deleted, vec!["stale"]);
        assert_eq!(names(&api, &destination()), vec!["bug", "feature"]);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_mutate() {
        let api = scenario();
        let reconciler = Reconciler::new(api.clone());

        let options = SyncOptions {
            dry_run: true,
            delete: true,
        };
        let report = reconciler
            .sync(&source(), &destination(), options)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.created, vec!["feature"]);
        assert_eq!(report.updated, vec!["bug"]);
        assert_eq!(report.deleted, vec!["stale"]);
        assert!(report.fails.is_empty());
        assert_eq!(api.mutation_count(), 0);
        assert_eq!(names(&api, &destination()), vec!["bug", "stale"]);
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_processing_continues() {
        let api = scenario();
        api.fail_on(LabelAction::Create, "feature");
        let reconciler = Reconciler::new(api.clone());

        let options = SyncOptions {
            dry_run: false,
            delete: true,
        };
        let report = reconciler
            .sync(&source(), &destination(), options)
            .await
            .unwrap();

        assert_eq!(report.fails.len(), 1);
        assert_eq!(report.fails[0].action, LabelAction::Create);
        assert_eq!(report.fails[0].name, "feature");
        assert!(report.created.is_empty());
        assert_eq!(report.updated, vec!["bug"]);
        assert_eq!(report.deleted, vec!["stale"]);
        assert_eq!(names(&api, &destination()), vec!["bug"]);
    }

    #[tokio::test]
    async fn test_second_run_only_updates() {
        let api = scenario();
        let reconciler = Reconciler::new(api.clone());

        let options = SyncOptions {
            dry_run: false,
            delete: true,
        };
        reconciler
            .sync(&source(), &destination(), options)
            .await
            .unwrap();

        let prepared = reconciler
            .prepare(&source(), &destination(), true)
            .await
            .unwrap();
        assert!(prepared.plan.to_create.is_empty());
        assert!(prepared.plan.to_delete.is_empty());
        assert_eq!(prepared.plan.to_update.len(), 2);
        assert_eq!(prepared.destination_labels, prepared.source_labels);
    }

    #[tokio::test]
    async fn test_missing_source_is_fatal() {
        let api = InMemoryLabels::new().with_repo(&destination(), Vec::new());
        let reconciler = Reconciler::new(api.clone());

        let err = reconciler
            .sync(&source(), &destination(), SyncOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Resolution {
                role: RepoRole::Source,
                ..
            }
        ));
        assert!(err
            .to_string()
            .starts_with("Source repo is not a repo: octo/source"));
    }

    #[tokio::test]
    async fn test_missing_destination_is_fatal() {
        let api = InMemoryLabels::new().with_repo(&source(), vec![Label::new("bug", "ff0000")]);
        let reconciler = Reconciler::new(api.clone());

        let err = reconciler
            .prepare(&source(), &destination(), false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Resolution {
                role: RepoRole::Destination,
                ..
            }
        ));
        assert_eq!(api.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_during_resolution_is_fatal() {
        let api = scenario();
        api.set_rate_limited(true);
        let reconciler = Reconciler::new(api);

        let err = reconciler
            .sync(&source(), &destination(), SyncOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Resolution {
                source: ApiError::RateLimited { .. },
                ..
            }
        ));
    }
}
