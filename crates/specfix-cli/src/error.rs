use std::path::PathBuf;

use specfix_diff::DiffError;
use specfix_patch::PatchError;

/// Failures that map to a dedicated exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{} is not valid JSON: {source}", path.display())]
    MalformedJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} is not a valid edit set: {source}", path.display())]
    MalformedEditSet {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("patched document differs from {}", fixed.display())]
    VerifyMismatch { fixed: PathBuf },
}

pub const EXIT_GENERAL: u8 = 1;
pub const EXIT_MALFORMED: u8 = 2;
pub const EXIT_PROCESSING: u8 = 3;

/// Exit code for an error bubbling out of a command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return match cli {
                CliError::MalformedJson { .. } | CliError::MalformedEditSet { .. } => EXIT_MALFORMED,
                CliError::VerifyMismatch { .. } => EXIT_PROCESSING,
            };
        }
        if cause.is::<PatchError>() {
            return EXIT_PROCESSING;
        }
        if let Some(diff) = cause.downcast_ref::<DiffError>() {
            return match diff {
                DiffError::InvalidThreshold { .. } => EXIT_GENERAL,
                DiffError::Edit(_) => EXIT_PROCESSING,
            };
        }
    }
    EXIT_GENERAL
}
