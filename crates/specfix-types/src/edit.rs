//! Edits: single recorded differences between two documents.
//!
//! An [`Edit`] pairs a target [`Path`] with an [`EditOp`]. Array elements are
//! addressed in one of two ways:
//!
//! - **Array-tracked** edits (`content_hash` set) target a whole element. The
//!   path ends in the element's index at diff time, but the applier finds the
//!   element by content, so the edit survives reordering.
//! - **Anchored** edits (an [`ElementAnchor`]) change a field *inside* an
//!   element. The anchor remembers the array and the element's hash in the
//!   original document so the applier can relocate it.
//!
//! Edits are immutable once built; the builder-style `with_*` methods consume
//! and return a new value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EditError;
use crate::hash::ContentHash;
use crate::path::{Path, PathSegment};

/// Maximum number of characters of a value shown in generated descriptions.
pub const PREVIEW_CHARS: usize = 50;

/// The closed vocabulary of edit operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    SetValue,
    AddIfMissing,
    DeleteValue,
    AddArrayItem,
    RemoveArrayItem,
    MoveArrayItem,
    ModifyArrayElement,
    RenameKey,
}

impl EditKind {
    /// The persisted `type` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetValue => "set_value",
            Self::AddIfMissing => "add_if_missing",
            Self::DeleteValue => "delete_value",
            Self::AddArrayItem => "add_array_item",
            Self::RemoveArrayItem => "remove_array_item",
            Self::MoveArrayItem => "move_array_item",
            Self::ModifyArrayElement => "modify_array_element",
            Self::RenameKey => "rename_key",
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an edit does, with its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum EditOp {
    /// Overwrite (or create) the value at the path. On an array-tracked edit
    /// this replaces the element whose hash is `old_content_hash`, unless
    /// more than `occurrence` copies of the new element already exist.
    SetValue {
        value: Value,
        old_value: Option<Value>,
        old_content_hash: Option<ContentHash>,
        occurrence: usize,
    },
    /// Create the value only if nothing is at the path.
    AddIfMissing { value: Value },
    /// Remove the value at the path.
    DeleteValue { old_value: Option<Value> },
    /// Append an element. `occurrence` counts earlier identical elements.
    AddArrayItem { value: Value, occurrence: usize },
    /// Remove an element while more than `retain` identical copies remain.
    RemoveArrayItem { value: Option<Value>, retain: usize },
    /// Informational: an identical element changed position.
    MoveArrayItem { from: usize, to: usize },
    /// Patch the first object element matching every criterion.
    ModifyArrayElement {
        match_criteria: Map<String, Value>,
        modifications: Map<String, Value>,
    },
    /// Rename a key of the object at the path.
    RenameKey { old_key: String, new_key: String },
}

impl EditOp {
    pub fn kind(&self) -> EditKind {
        match self {
            Self::SetValue { .. } => EditKind::SetValue,
            Self::AddIfMissing { .. } => EditKind::AddIfMissing,
            Self::DeleteValue { .. } => EditKind::DeleteValue,
            Self::AddArrayItem { .. } => EditKind::AddArrayItem,
            Self::RemoveArrayItem { .. } => EditKind::RemoveArrayItem,
            Self::MoveArrayItem { .. } => EditKind::MoveArrayItem,
            Self::ModifyArrayElement { .. } => EditKind::ModifyArrayElement,
            Self::RenameKey { .. } => EditKind::RenameKey,
        }
    }
}

/// Locates the array element that a field-level edit belongs to.
///
/// Identical elements share a hash, so the anchor also records how many
/// identical elements precede this one in the array.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementAnchor {
    array_path: Path,
    element_hash: ContentHash,
    occurrence: usize,
}

impl ElementAnchor {
    pub fn new(array_path: Path, element_hash: ContentHash) -> Self {
        Self::with_occurrence(array_path, element_hash, 0)
    }

    pub fn with_occurrence(array_path: Path, element_hash: ContentHash, occurrence: usize) -> Self {
        Self {
            array_path,
            element_hash,
            occurrence,
        }
    }

    /// Path of the array holding the element.
    pub fn array_path(&self) -> &Path {
        &self.array_path
    }

    /// Hash of the element as it appears in the original document.
    pub fn element_hash(&self) -> ContentHash {
        self.element_hash
    }

    /// Number of identical elements before this one.
    pub fn occurrence(&self) -> usize {
        self.occurrence
    }

    /// Position of the element's index segment within an anchored edit path.
    pub fn index_position(&self) -> usize {
        self.array_path.len()
    }
}

/// Identity used to de-duplicate edits when merging into an edit set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeKey {
    pub path: Path,
    pub content_hash: Option<ContentHash>,
}

/// One recorded difference, ready to be persisted and re-applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EditRecord", into = "EditRecord")]
pub struct Edit {
    path: Path,
    op: EditOp,
    description: String,
    content_hash: Option<ContentHash>,
    anchor: Option<ElementAnchor>,
}

impl Edit {
    fn plain(path: Path, op: EditOp, description: String) -> Self {
        Self {
            path,
            op,
            description,
            content_hash: None,
            anchor: None,
        }
    }

    pub fn set_value(path: Path, value: Value, old_value: Option<Value>) -> Self {
        let description = format!("Update value at {path}: {}", preview(&value));
        Self::plain(
            path,
            EditOp::SetValue {
                value,
                old_value,
                old_content_hash: None,
                occurrence: 0,
            },
            description,
        )
    }

    pub fn add_if_missing(path: Path, value: Value) -> Self {
        let description = format!("Add missing value at {path}: {}", preview(&value));
        Self::plain(path, EditOp::AddIfMissing { value }, description)
    }

    pub fn delete_value(path: Path, old_value: Option<Value>) -> Self {
        let description = format!("Remove value at {path}");
        Self::plain(path, EditOp::DeleteValue { old_value }, description)
    }

    /// Rename `old_key` to `new_key` in the object at `parent`.
    pub fn rename_key(parent: Path, old_key: impl Into<String>, new_key: impl Into<String>) -> Self {
        let (old_key, new_key) = (old_key.into(), new_key.into());
        let description = format!("Rename {old_key:?} to {new_key:?} at {parent}");
        Self::plain(parent, EditOp::RenameKey { old_key, new_key }, description)
    }

    /// Patch the first object in the array at `array_path` that matches.
    pub fn modify_array_element(
        array_path: Path,
        match_criteria: Map<String, Value>,
        modifications: Map<String, Value>,
    ) -> Self {
        let description = format!(
            "Modify element of {array_path} matching {}",
            preview(&Value::Object(match_criteria.clone()))
        );
        Self::plain(
            array_path,
            EditOp::ModifyArrayElement {
                match_criteria,
                modifications,
            },
            description,
        )
    }

    fn tracked(path: Path, op: EditOp, description: String, hash: ContentHash) -> Self {
        Self {
            path,
            op,
            description,
            content_hash: Some(hash),
            anchor: None,
        }
    }

    /// An element that exists only in the new array.
    pub fn add_array_item(
        array_path: &Path,
        index: usize,
        value: Value,
        hash: ContentHash,
        occurrence: usize,
    ) -> Self {
        let description = format!("Add new array item at position {index}: {}", preview(&value));
        Self::tracked(
            array_path.child(index),
            EditOp::AddArrayItem { value, occurrence },
            description,
            hash,
        )
    }

    /// An element that exists only in the old array.
    pub fn remove_array_item(
        array_path: &Path,
        index: usize,
        value: Value,
        hash: ContentHash,
        retain: usize,
    ) -> Self {
        let description = format!(
            "Remove array item from position {index}: {}",
            preview(&value)
        );
        Self::tracked(
            array_path.child(index),
            EditOp::RemoveArrayItem {
                value: Some(value),
                retain,
            },
            description,
            hash,
        )
    }

    /// An identical element found at a different position.
    pub fn move_array_item(
        array_path: &Path,
        from: usize,
        to: usize,
        value: &Value,
        hash: ContentHash,
    ) -> Self {
        let description = format!(
            "Array item moved from position {from} to {to}: {}",
            preview(value)
        );
        Self::tracked(
            array_path.child(to),
            EditOp::MoveArrayItem { from, to },
            description,
            hash,
        )
    }

    /// Whole-element replacement, located by the old element's hash.
    /// `occurrence` counts earlier elements identical to `new_value`.
    pub fn replace_array_item(
        array_path: &Path,
        index: usize,
        old_value: Value,
        new_value: Value,
        old_hash: ContentHash,
        new_hash: ContentHash,
        occurrence: usize,
    ) -> Self {
        let description = format!(
            "Update array item at position {index}: {}",
            preview(&new_value)
        );
        Self::tracked(
            array_path.child(index),
            EditOp::SetValue {
                value: new_value,
                old_value: Some(old_value),
                old_content_hash: Some(old_hash),
                occurrence,
            },
            description,
            new_hash,
        )
    }

    /// Replace the generated description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Tie this edit to an array element. The anchor's array path must be an
    /// element prefix of this edit's path.
    pub fn with_anchor(mut self, anchor: ElementAnchor) -> Result<Self, EditError> {
        check_anchor(&self.path, &anchor)?;
        self.anchor = Some(anchor);
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn op(&self) -> &EditOp {
        &self.op
    }

    pub fn kind(&self) -> EditKind {
        self.op.kind()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Hash of the targeted element, for array-tracked edits.
    pub fn content_hash(&self) -> Option<ContentHash> {
        self.content_hash
    }

    pub fn anchor(&self) -> Option<&ElementAnchor> {
        self.anchor.as_ref()
    }

    pub fn is_array_tracked(&self) -> bool {
        self.content_hash.is_some()
    }

    /// For array-tracked edits: the array path and the element index stored
    /// at diff time.
    pub fn element_target(&self) -> Option<(Path, usize)> {
        self.content_hash?;
        let index = self.path.last()?.as_index()?;
        Some((self.path.parent()?, index))
    }

    pub fn merge_key(&self) -> MergeKey {
        MergeKey {
            path: self.path.clone(),
            content_hash: self.content_hash,
        }
    }
}

fn check_anchor(path: &Path, anchor: &ElementAnchor) -> Result<(), EditError> {
    let position = anchor.index_position();
    let is_element_prefix = path.starts_with(anchor.array_path())
        && matches!(path.segments().get(position), Some(PathSegment::Index(_)));
    if is_element_prefix {
        Ok(())
    } else {
        Err(EditError::InconsistentAnchor {
            path: path.encode(),
            array_path: anchor.array_path().encode(),
        })
    }
}

/// Compact JSON rendering of `value`, cut to [`PREVIEW_CHARS`] characters.
pub fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= PREVIEW_CHARS {
        return rendered;
    }
    let mut cut: String = rendered.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

// ---------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Flat persisted form of an [`Edit`].
#[derive(Serialize, Deserialize)]
struct EditRecord {
    #[serde(rename = "type")]
    kind: EditKind,
    path: Path,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_content_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "is_false")]
    array_tracking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    array_path: Option<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "is_zero")]
    element_occurrence: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    occurrence: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    retain: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    match_criteria: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modifications: Option<Map<String, Value>>,
}

impl EditRecord {
    fn empty(kind: EditKind, path: Path, description: String) -> Self {
        Self {
            kind,
            path,
            description,
            value: None,
            old_value: None,
            content_hash: None,
            old_content_hash: None,
            array_tracking: false,
            array_path: None,
            element_hash: None,
            element_occurrence: 0,
            occurrence: 0,
            retain: 0,
            old_position: None,
            new_position: None,
            old_key: None,
            new_key: None,
            match_criteria: None,
            modifications: None,
        }
    }
}

impl From<Edit> for EditRecord {
    fn from(edit: Edit) -> Self {
        let mut record = EditRecord::empty(edit.op.kind(), edit.path, edit.description);
        record.content_hash = edit.content_hash;
        record.array_tracking = edit.content_hash.is_some() || edit.anchor.is_some();
        if let Some(anchor) = edit.anchor {
            record.array_path = Some(anchor.array_path);
            record.element_hash = Some(anchor.element_hash);
            record.element_occurrence = anchor.occurrence;
        }

        match edit.op {
            EditOp::SetValue {
                value,
                old_value,
                old_content_hash,
                occurrence,
            } => {
                record.value = Some(value);
                record.old_value = old_value;
                record.old_content_hash = old_content_hash;
                record.occurrence = occurrence;
            }
            EditOp::AddIfMissing { value } => record.value = Some(value),
            EditOp::DeleteValue { old_value } => record.old_value = old_value,
            EditOp::AddArrayItem { value, occurrence } => {
                record.value = Some(value);
                record.occurrence = occurrence;
            }
            EditOp::RemoveArrayItem { value, retain } => {
                record.value = value;
                record.retain = retain;
            }
            EditOp::MoveArrayItem { from, to } => {
                record.old_position = Some(from);
                record.new_position = Some(to);
            }
            EditOp::ModifyArrayElement {
                match_criteria,
                modifications,
            } => {
                record.match_criteria = Some(match_criteria);
                record.modifications = Some(modifications);
            }
            EditOp::RenameKey { old_key, new_key } => {
                record.old_key = Some(old_key);
                record.new_key = Some(new_key);
            }
        }
        record
    }
}

impl TryFrom<EditRecord> for Edit {
    type Error = EditError;

    fn try_from(record: EditRecord) -> Result<Self, Self::Error> {
        let kind = record.kind;
        let missing = |field: &'static str| EditError::MissingField {
            kind: kind.as_str(),
            path: record.path.encode(),
            field,
        };
        let stored_index = record
            .path
            .last()
            .and_then(PathSegment::as_index)
            .unwrap_or(0);

        let op = match kind {
            EditKind::SetValue => EditOp::SetValue {
                value: record.value.unwrap_or(Value::Null),
                old_value: record.old_value,
                old_content_hash: record.old_content_hash,
                occurrence: record.occurrence,
            },
            EditKind::AddIfMissing => EditOp::AddIfMissing {
                value: record.value.unwrap_or(Value::Null),
            },
            EditKind::DeleteValue => EditOp::DeleteValue {
                old_value: record.old_value,
            },
            EditKind::AddArrayItem => EditOp::AddArrayItem {
                value: record.value.unwrap_or(Value::Null),
                occurrence: record.occurrence,
            },
            EditKind::RemoveArrayItem => EditOp::RemoveArrayItem {
                value: record.value,
                retain: record.retain,
            },
            EditKind::MoveArrayItem => EditOp::MoveArrayItem {
                from: record.old_position.unwrap_or(stored_index),
                to: record.new_position.unwrap_or(stored_index),
            },
            EditKind::ModifyArrayElement => EditOp::ModifyArrayElement {
                match_criteria: record.match_criteria.unwrap_or_default(),
                modifications: record.modifications.unwrap_or_default(),
            },
            EditKind::RenameKey => EditOp::RenameKey {
                old_key: record.old_key.ok_or_else(|| missing("old_key"))?,
                new_key: record.new_key.ok_or_else(|| missing("new_key"))?,
            },
        };

        if record.content_hash.is_some()
            && !matches!(record.path.last(), Some(PathSegment::Index(_)))
        {
            return Err(EditError::NotAnElementPath(record.path.encode()));
        }

        let anchor = match (record.array_path, record.element_hash) {
            (Some(array_path), Some(hash)) => {
                let anchor =
                    ElementAnchor::with_occurrence(array_path, hash, record.element_occurrence);
                check_anchor(&record.path, &anchor)?;
                Some(anchor)
            }
            (None, Some(_)) => return Err(missing("array_path")),
            _ => None,
        };

        Ok(Edit {
            path: record.path,
            op,
            description: record.description,
            content_hash: record.content_hash,
            anchor,
        })
    }
}
