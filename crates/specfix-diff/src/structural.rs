//! Structural diff of two whole documents.

use serde_json::{Map, Value};
use specfix_types::{Edit, Path};
use tracing::debug;

use crate::config::DiffConfig;
use crate::error::DiffResult;
use crate::reconcile::ArrayReconciler;

/// Walks two documents in lock-step and records every difference as an
/// [`Edit`] against the old one.
#[derive(Clone, Debug, Default)]
pub struct StructuralDiffer {
    config: DiffConfig,
    reconciler: ArrayReconciler,
}

impl StructuralDiffer {
    /// Create a differ, rejecting out-of-range thresholds.
    pub fn new(config: DiffConfig) -> DiffResult<Self> {
        config.validate()?;
        Ok(Self {
            reconciler: ArrayReconciler::new(&config.reconcile),
            config,
        })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// All edits that turn `old` into `new`.
    ///
    /// Map keys are visited in the old document's order, followed by keys
    /// that exist only in the new one. Arrays are handed to the
    /// [`ArrayReconciler`].
    pub fn diff(&self, old: &Value, new: &Value) -> DiffResult<Vec<Edit>> {
        let mut edits = Vec::new();
        self.walk(old, new, &Path::root(), &mut edits)?;
        debug!(edits = edits.len(), "structural diff complete");
        Ok(edits)
    }

    fn walk(&self, old: &Value, new: &Value, path: &Path, out: &mut Vec<Edit>) -> DiffResult<()> {
        if old == new || self.config.is_excluded(path) {
            return Ok(());
        }
        match (old, new) {
            (Value::Object(a), Value::Object(b)) => self.walk_maps(a, b, path, out),
            (Value::Array(a), Value::Array(b)) => {
                let reconciliation = self.reconciler.reconcile(a, b, path)?;
                out.extend(reconciliation.edits);
                Ok(())
            }
            _ => {
                out.push(Edit::set_value(path.clone(), new.clone(), Some(old.clone())));
                Ok(())
            }
        }
    }

    fn walk_maps(
        &self,
        old: &Map<String, Value>,
        new: &Map<String, Value>,
        path: &Path,
        out: &mut Vec<Edit>,
    ) -> DiffResult<()> {
        for (key, old_value) in old {
            let child = path.child(key.as_str());
            match new.get(key) {
                Some(new_value) => self.walk(old_value, new_value, &child, out)?,
                None if self.config.is_excluded(&child) => {}
                None => out.push(Edit::delete_value(child, Some(old_value.clone()))),
            }
        }
        for (key, new_value) in new {
            if old.contains_key(key) {
                continue;
            }
            let child = path.child(key.as_str());
            if !self.config.is_excluded(&child) {
                out.push(Edit::add_if_missing(child, new_value.clone()));
            }
        }
        Ok(())
    }
}

/// Diff two documents with the default configuration.
pub fn diff_documents(old: &Value, new: &Value) -> DiffResult<Vec<Edit>> {
    StructuralDiffer::default().diff(old, new)
}
