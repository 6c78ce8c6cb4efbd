//! Error types for the diff crate.

use specfix_types::EditError;

/// Errors that can occur during diff operations.
///
/// Differences in the documents themselves are never errors; only a bad
/// configuration or an internally inconsistent edit is.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A heuristic threshold lies outside `0.0..=1.0`.
    #[error("invalid threshold `{name}`: {value} is not within 0.0..=1.0")]
    InvalidThreshold { name: &'static str, value: f64 },

    /// An edit could not be built consistently.
    #[error("edit construction failed: {0}")]
    Edit(#[from] EditError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
