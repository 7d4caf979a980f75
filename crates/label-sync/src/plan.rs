//! Partition of label names into create/update/delete sets.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::label::LabelIndex;

/// Names to create, update and delete in the target.
///
/// The sets are pairwise disjoint and iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    /// In source, missing from target.
    pub to_create: BTreeSet<String>,
    /// In both. Rewritten every run regardless of whether attributes differ.
    pub to_update: BTreeSet<String>,
    /// In target, missing from source. Empty unless deletion was enabled.
    pub to_delete: BTreeSet<String>,
}

impl SyncPlan {
    /// Compute the plan from both label collections.
    pub fn compute(source: &LabelIndex, target: &LabelIndex, delete_enabled: bool) -> Self {
        let (to_update, to_create) = source
            .keys()
            .cloned()
            .partition(|name| target.contains_key(name));

        let to_delete = if delete_enabled {
            target
                .keys()
                .filter(|name| !source.contains_key(*name))
                .cloned()
                .collect()
        } else {
            BTreeSet::new()
        };

        Self {
            to_create,
            to_update,
            to_delete,
        }
    }

    /// Total number of label actions in the plan.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
