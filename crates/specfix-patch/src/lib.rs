//! Patch applier for specfix.
//!
//! Replays a persisted [`EditSet`](specfix_types::EditSet) onto a freshly
//! generated document and reports, per edit, whether it was applied or why
//! it was skipped.
//!
//! # Key Types
//!
//! - [`PatchApplier`] -- Applies an edit set to a document
//! - [`ApplyReport`] / [`EditOutcome`] / [`Outcome`] -- What happened to each edit

pub mod applier;
pub mod error;
mod relocate;
pub mod report;

pub use applier::PatchApplier;
pub use error::{PatchError, PatchResult};
pub use report::{Action, ApplyReport, EditOutcome, Outcome, SkipReason};
