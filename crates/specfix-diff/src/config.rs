use serde::{Deserialize, Serialize};
use specfix_types::Path;

use crate::error::{DiffError, DiffResult};

/// Thresholds and switches for array reconciliation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum fraction of shared keys, relative to the larger object, for
    /// two objects to count as the same element.
    pub key_overlap: f64,
    /// Fraction of shared keys whose values must be equal (strictly more
    /// than this) to pair elements found at different positions.
    pub value_agreement: f64,
    /// Emit informational `move_array_item` edits for identical elements
    /// that changed position.
    pub track_moves: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            key_overlap: 0.5,
            value_agreement: 0.7,
            track_moves: true,
        }
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> DiffResult<()> {
        check_unit("key_overlap", self.key_overlap)?;
        check_unit("value_agreement", self.value_agreement)
    }
}

/// Configuration for a structural diff run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub reconcile: ReconcileConfig,
    /// Subtrees that are never compared.
    pub exclude: Vec<Path>,
}

impl DiffConfig {
    pub fn validate(&self) -> DiffResult<()> {
        self.reconcile.validate()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|prefix| path.starts_with(prefix))
    }
}

fn check_unit(name: &'static str, value: f64) -> DiffResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DiffError::InvalidThreshold { name, value })
    }
}
