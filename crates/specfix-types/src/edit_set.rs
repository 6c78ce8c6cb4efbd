//! The persisted, ordered collection of edits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::edit::{Edit, MergeKey};
use crate::path::Path;

/// Format version written into new edit sets.
pub const EDIT_SET_VERSION: &str = "4.0";

fn default_version() -> String {
    EDIT_SET_VERSION.to_string()
}

/// An ordered, de-duplicated collection of [`Edit`]s plus free-form metadata.
///
/// Created by a diff run, extended by later diff runs through
/// [`merge`](EditSet::merge), and consumed read-only by every patch run. A
/// persisted set without `operations` reads as empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditSet {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    operations: Vec<Edit>,
}

impl Default for EditSet {
    fn default() -> Self {
        Self {
            version: default_version(),
            description: String::new(),
            metadata: Map::new(),
            operations: Vec::new(),
        }
    }
}

/// Outcome of merging candidate edits into an [`EditSet`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeSummary {
    /// Edits appended to the set, in candidate order.
    pub added: Vec<Edit>,
    /// Number of candidates dropped because their key was already present.
    pub skipped: usize,
}

impl MergeSummary {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

impl EditSet {
    /// An empty set with the given description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build a set from candidate edits, de-duplicated and sorted.
    pub fn from_edits(edits: impl IntoIterator<Item = Edit>) -> Self {
        let mut set = Self::default();
        set.merge(edits);
        set
    }

    pub fn operations(&self) -> &[Edit] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edit> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// All edits stored at exactly `path`.
    pub fn find<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Edit> + 'a {
        self.operations.iter().filter(move |e| e.path() == path)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.find(path).next().is_some()
    }

    /// Candidates whose merge key is not yet in the set, without modifying it.
    pub fn new_edits(&self, candidates: impl IntoIterator<Item = Edit>) -> Vec<Edit> {
        let mut seen = self.keys();
        candidates
            .into_iter()
            .filter(|edit| seen.insert(edit.merge_key()))
            .collect()
    }

    /// Append the candidates not already present, then sort by path.
    ///
    /// Re-running a diff against the same documents adds nothing. Edits that
    /// a reviewer edited by hand keep their content because existing keys win.
    pub fn merge(&mut self, candidates: impl IntoIterator<Item = Edit>) -> MergeSummary {
        let candidates: Vec<Edit> = candidates.into_iter().collect();
        let total = candidates.len();
        let added = self.new_edits(candidates);

        self.operations.extend(added.iter().cloned());
        self.sort();

        MergeSummary {
            skipped: total - added.len(),
            added,
        }
    }

    /// Stable sort by path; edits sharing a path keep their relative order.
    pub fn sort(&mut self) {
        self.operations.sort_by(|a, b| a.path().cmp(b.path()));
    }

    fn keys(&self) -> HashSet<MergeKey> {
        self.operations.iter().map(Edit::merge_key).collect()
    }
}

impl<'a> IntoIterator for &'a EditSet {
    type Item = &'a Edit;
    type IntoIter = std::slice::Iter<'a, Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
