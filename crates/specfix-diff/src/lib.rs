//! Diff engine for specfix.
//!
//! Compares a generated API description with its hand-corrected version and
//! records every difference as an [`Edit`](specfix_types::Edit) that can be
//! replayed on the next regeneration.
//!
//! # Key Types
//!
//! - [`StructuralDiffer`] -- Whole-document lock-step walk
//! - [`ArrayReconciler`] / [`Reconciliation`] / [`Slot`] -- Content-identified array pairing
//! - [`FieldModificationHeuristic`] -- Decides when two elements are one edited element
//! - [`DocumentDiff`] / [`DiffHunk`] / [`DiffLine`] -- Line-level diff of rendered documents

pub mod config;
pub mod error;
pub mod heuristic;
pub mod reconcile;
pub mod structural;
pub mod text_diff;

pub use config::{DiffConfig, ReconcileConfig};
pub use error::{DiffError, DiffResult};
pub use heuristic::FieldModificationHeuristic;
pub use reconcile::{ArrayReconciler, Reconciliation, Slot};
pub use structural::{diff_documents, StructuralDiffer};
pub use text_diff::{diff_rendered, diff_text, render_sorted, DiffHunk, DiffLine, DocumentDiff};
