//! Label and repository reference types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// An issue label.
///
/// Labels are matched across repositories by `name` only; `color` and
/// `description` are the payload copied from source to target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name, unique within a repository.
    pub name: String,
    /// Hex color triplet without the leading `#` (e.g. `d73a4a`).
    pub color: String,
    /// Optional description. `None` is distinct from an empty string.
    #[serde(default)]
    pub description: Option<String>,
}

impl Label {
    /// Create a label without a description.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Labels of one repository keyed by name.
pub type LabelIndex = BTreeMap<String, Label>;

/// Build a [`LabelIndex`] from a label list. Later duplicates win.
pub fn index_labels(labels: impl IntoIterator<Item = Label>) -> LabelIndex {
    labels
        .into_iter()
        .map(|label| (label.name.clone(), label))
        .collect()
}

/// A repository reference in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(SyncError::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
