//! In-process [`LabelApi`] backed by a shared map.
//!
//! Lets tests drive the reconciler and its failure handling without a
//! network. Clones share the same store.
//!
//! Unlike [`GitHubLabels`](super::github::GitHubLabels), deleting a label that
//! does not exist fails with [`ApiError::NotFound`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ApiError, LabelApi};
use crate::label::{index_labels, Label, LabelIndex, RepoRef};
use crate::report::LabelAction;

#[derive(Debug, Default)]
struct Store {
    repos: BTreeMap<String, LabelIndex>,
    failures: BTreeSet<(LabelAction, String)>,
    rate_limited: bool,
    mutations: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryLabels {
    store: Arc<Mutex<Store>>,
}

impl InMemoryLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a repository with the given labels.
    #[must_use]
    pub fn with_repo(self, repo: &RepoRef, labels: impl IntoIterator<Item = Label>) -> Self {
        self.lock().repos.insert(repo.to_string(), index_labels(labels));
        self
    }

    /// Make every `action` on the label `name` fail with an API error.
    pub fn fail_on(&self, action: LabelAction, name: impl Into<String>) {
        self.lock().failures.insert((action, name.into()));
    }

    /// Make every call fail as if the provider's rate limit were exhausted.
    pub fn set_rate_limited(&self, rate_limited: bool) {
        self.lock().rate_limited = rate_limited;
    }

    /// Current labels of a repository, sorted by name.
    pub fn labels(&self, repo: &RepoRef) -> Option<Vec<Label>> {
        self.lock()
            .repos
            .get(&repo.to_string())
            .map(|index| index.values().cloned().collect())
    }

    /// Number of successful create/edit/delete calls so far.
    pub fn mutation_count(&self) -> usize {
        self.lock().mutations
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store {
    fn check_rate_limit(&self) -> Result<(), ApiError> {
        if self.rate_limited {
            return Err(ApiError::RateLimited { reset_at: None });
        }
        Ok(())
    }

    fn check_failure(&self, action: LabelAction, name: &str) -> Result<(), ApiError> {
        if self.failures.contains(&(action, name.to_string())) {
            return Err(ApiError::Api {
                status: 500,
                message: format!("simulated {action} failure for '{name}'"),
            });
        }
        Ok(())
    }

    fn repo(&self, repo: &RepoRef) -> Result<&LabelIndex, ApiError> {
        self.check_rate_limit()?;
        self.repos
            .get(&repo.to_string())
            .ok_or_else(|| ApiError::NotFound(repo.to_string()))
    }

    fn repo_mut(&mut self, repo: &RepoRef) -> Result<&mut LabelIndex, ApiError> {
        self.check_rate_limit()?;
        self.repos
            .get_mut(&repo.to_string())
            .ok_or_else(|| ApiError::NotFound(repo.to_string()))
    }
}

#[async_trait]
impl LabelApi for InMemoryLabels {
    async fn get_repo(&self, repo: &RepoRef) -> Result<(), ApiError> {
        self.lock().repo(repo).map(|_| ())
    }

    async fn list_labels(&self, repo: &RepoRef) -> Result<Vec<Label>, ApiError> {
        Ok(self.lock().repo(repo)?.values().cloned().collect())
    }

    async fn get_label(&self, repo: &RepoRef, name: &str) -> Result<Label, ApiError> {
        self.lock()
            .repo(repo)?
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("label '{name}' in {repo}")))
    }

    async fn create_label(&self, repo: &RepoRef, label: &Label) -> Result<(), ApiError> {
        let mut store = self.lock();
        store.check_failure(LabelAction::Create, &label.name)?;
        let labels = store.repo_mut(repo)?;
        if labels.contains_key(&label.name) {
            return Err(ApiError::Validation(format!(
                "label '{}' already_exists",
                label.name
            )));
        }
        labels.insert(label.name.clone(), label.clone());
        store.mutations += 1;
        Ok(())
    }

    async fn edit_label(
        &self,
        repo: &RepoRef,
        current_name: &str,
        label: &Label,
    ) -> Result<(), ApiError> {
        let mut store = self.lock();
        store.check_failure(LabelAction::Update, current_name)?;
        let labels = store.repo_mut(repo)?;
        if labels.remove(current_name).is_none() {
            return Err(ApiError::NotFound(format!(
                "label '{current_name}' in {repo}"
            )));
        }
        labels.insert(label.name.clone(), label.clone());
        store.mutations += 1;
        Ok(())
    }

    async fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<(), ApiError> {
        let mut store = self.lock();
        store.check_failure(LabelAction::Delete, name)?;
        let labels = store.repo_mut(repo)?;
        if labels.remove(name).is_none() {
            return Err(ApiError::NotFound(format!("label '{name}' in {repo}")));
        }
        store.mutations += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_repo_not_found() {
        let api = InMemoryLabels::new();
        let err = api.get_repo(&RepoRef::new("octo", "missing")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mutations_are_shared_between_clones() {
        let repo = RepoRef::new("octo", "target");
        let api = InMemoryLabels::new().with_repo(&repo, vec![Label::new("bug", "ff0000")]);
        let handle = api.clone();

        api.create_label(&repo, &Label::new("docs", "0075ca"))
            .await
            .unwrap();
        api.delete_label(&repo, "bug").await.unwrap();

        let names: Vec<_> = handle
            .labels(&repo)
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["docs"]);
        assert_eq!(handle.mutation_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_of_missing_label_is_not_found() {
        let repo = RepoRef::new("octo", "target");
        let api = InMemoryLabels::new().with_repo(&repo, Vec::new());
        let err = api.delete_label(&repo, "stale").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(api.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let repo = RepoRef::new("octo", "target");
        let api = InMemoryLabels::new().with_repo(&repo, vec![Label::new("bug", "ff0000")]);
        let err = api
            .create_label(&repo, &Label::new("bug", "00ff00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(api.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let repo = RepoRef::new("octo", "target");
        let api = InMemoryLabels::new().with_repo(&repo, Vec::new());
        api.fail_on(LabelAction::Create, "feature");

        let err = api
            .create_label(&repo, &Label::new("feature", "00ff00"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
        assert!(api
            .create_label(&repo, &Label::new("other", "00ff00"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let repo = RepoRef::new("octo", "target");
        let api = InMemoryLabels::new().with_repo(&repo, Vec::new());
        api.set_rate_limited(true);
        assert!(matches!(
            api.list_labels(&repo).await,
            Err(ApiError::RateLimited { reset_at: None })
        ));
    }
}
