//! Foundation types for specfix.
//!
//! specfix records the corrections a human made to a machine-generated API
//! description as a re-applicable list of edits. This crate holds the shared
//! vocabulary; every other specfix crate depends on `specfix-types`.
//!
//! # Key Types
//!
//! - [`Path`] / [`PathSegment`]: Typed address into a JSON document, with an escaping `|` encoding
//! - [`address`]: get / set / exists / delete / rename against a document
//! - [`ContentHash`]: Position-independent identity of a document value
//! - [`Edit`] / [`EditOp`] / [`EditKind`]: One recorded difference
//! - [`EditSet`]: The persisted, de-duplicated edit collection

pub mod address;
pub mod edit;
pub mod edit_set;
pub mod error;
pub mod hash;
pub mod path;

pub use edit::{preview, Edit, EditKind, EditOp, ElementAnchor, MergeKey};
pub use edit_set::{EditSet, MergeSummary, EDIT_SET_VERSION};
pub use error::{EditError, PathError};
pub use hash::ContentHash;
pub use path::{Path, PathSegment};

/// A JSON document or fragment.
pub type Document = serde_json::Value;
