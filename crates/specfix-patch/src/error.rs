use specfix_types::PathError;

/// Errors that abort a patch run.
///
/// Edits that do not fit the document are reported as skipped, never raised.
/// Only a path that cannot be addressed at all stops the run.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("cannot apply edit: {0}")]
    Path(#[from] PathError),
}

pub type PatchResult<T> = Result<T, PatchError>;
