//! Outcome of applying a sync plan.

use std::fmt;

use serde::Serialize;

/// A per-label action against the target repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for LabelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A label action that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAction {
    pub action: LabelAction,
    pub name: String,
    pub error: String,
}

/// Results of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Source repository (`owner/name`).
    pub source: String,
    /// Destination repository (`owner/name`).
    pub destination: String,
    /// Whether mutations were skipped.
    pub dry_run: bool,
    /// Labels created (or that would have been, in a dry run).
    pub created: Vec<String>,
    /// Labels overwritten from source.
    pub updated: Vec<String>,
    /// Labels removed from the destination.
    pub deleted: Vec<String>,
    /// Failed actions in the order they were attempted.
    pub fails: Vec<FailedAction>,
}

impl SyncReport {
    pub(crate) fn new(source: String, destination: String, dry_run: bool) -> Self {
        Self {
            source,
            destination,
            dry_run,
            ..Self::default()
        }
    }

    pub(crate) fn record_success(&mut self, action: LabelAction, name: &str) {
        let list = match action {
            LabelAction::Create => &mut self.created,
            LabelAction::Update => &mut self.updated,
            LabelAction::Delete => &mut self.deleted,
        };
        list.push(name.to_string());
    }

    pub(crate) fn record_failure(&mut self, action: LabelAction, name: &str, error: String) {
        self.fails.push(FailedAction {
            action,
            name: name.to_string(),
            error,
        });
    }

    pub fn is_success(&self) -> bool {
        self.fails.is_empty()
    }

    /// Number of labels acted on successfully.
    pub fn succeeded(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_by_action() {
        let mut report = SyncReport::new("a/src".into(), "a/dst".into(), false);
        report.record_success(LabelAction::Create, "feature");
        report.record_success(LabelAction::Update, "bug");
        report.record_failure(LabelAction::Delete, "stale", "boom".into());

        assert_eq!(report.created, vec!["feature"]);
        assert_eq!(report.updated, vec!["bug"]);
        assert!(report.deleted.is_empty());
        assert_eq!(report.succeeded(), 2);
        assert!(!report.is_success());
        assert_eq!(report.fails[0].action, LabelAction::Delete);
    }

    #[test]
    fn test_serializes_actions_lowercase() {
        let mut report = SyncReport::new("a/src".into(), "a/dst".into(), true);
        report.record_failure(LabelAction::Create, "bug", "nope".into());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["fails"][0]["action"], "create");
        assert_eq!(json["fails"][0]["name"], "bug");
    }
}
