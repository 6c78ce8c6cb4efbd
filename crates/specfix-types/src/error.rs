use thiserror::Error;

/// Structural errors raised while addressing a document by [`Path`].
///
/// These are precondition violations on the caller's side. A value that is
/// simply missing is never an error; lookups report it as `None`.
///
/// [`Path`]: crate::Path
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path `{0}`: the root value has no parent")]
    InvalidPath(String),

    #[error("invalid escape sequence in path segment `{0}`")]
    InvalidEscape(String),

    #[error("array index {index} out of range (len {len}) at `{path}`")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("cannot descend into a scalar value at `{path}`")]
    NotAContainer { path: String },

    #[error("map key used on an array at `{path}`")]
    KeyOnArray { path: String },
}

/// Errors produced while decoding a persisted edit or content hash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("`{kind}` edit at `{path}` is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        path: String,
        field: &'static str,
    },

    #[error("array-tracked edit at `{0}` does not end in an array index")]
    NotAnElementPath(String),

    #[error("array path `{array_path}` is not an element prefix of `{path}`")]
    InconsistentAnchor { path: String, array_path: String },
}
