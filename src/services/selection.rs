use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Files checked for a bulk action. Owned by one caller; no locking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership; returns whether `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Select every id, or clear when all of them were already selected.
    pub fn toggle_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let all: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if !all.is_empty() && all.is_subset(&self.ids) {
            self.ids.retain(|id| !all.contains(id));
        } else {
            self.ids.extend(all);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot of the selected ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
