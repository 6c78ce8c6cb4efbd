//! Reading and mutating a document through a [`Path`].
//!
//! Lookups never fail: a missing key, an out-of-bounds index, or a path that
//! runs into a scalar all read as "absent". Mutations report structural misuse
//! (`IndexOutOfRange`, `NotAContainer`, `KeyOnArray`, deleting the root) as
//! [`PathError`]s and leave the document untouched in that case.

use serde_json::{Map, Value};

use crate::error::PathError;
use crate::path::{Path, PathSegment};

/// The value at `path`, if present.
pub fn get<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(doc, |current, segment| step(current, segment))
}

/// Mutable access to the value at `path`, if present.
pub fn get_mut<'a>(doc: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = doc;
    for segment in path.segments() {
        current = match current {
            Value::Object(map) => map.get_mut(&segment.as_key())?,
            Value::Array(items) => items.get_mut(segment.as_index()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Whether `path` resolves to a value (including JSON `null`).
pub fn exists(doc: &Value, path: &Path) -> bool {
    get(doc, path).is_some()
}

/// Write `value` at `path`.
///
/// Missing map segments along the way are created as empty objects; arrays
/// are never created implicitly. Setting the root path replaces the whole
/// document.
pub fn set(doc: &mut Value, path: &Path, value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.segments().split_last() else {
        *doc = value;
        return Ok(());
    };

    let mut current = doc;
    for (depth, segment) in parents.iter().enumerate() {
        current = match current {
            Value::Object(map) => map
                .entry(segment.as_key())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index = array_index(segment, items.len(), path, depth)?;
                &mut items[index]
            }
            _ => {
                return Err(PathError::NotAContainer {
                    path: prefix(path, depth),
                })
            }
        };
    }

    let depth = parents.len();
    match current {
        Value::Object(map) => {
            map.insert(last.as_key(), value);
        }
        Value::Array(items) => {
            let index = array_index(last, items.len(), path, depth)?;
            items[index] = value;
        }
        _ => {
            return Err(PathError::NotAContainer {
                path: prefix(path, depth),
            })
        }
    }
    Ok(())
}

/// Remove the value at `path`, returning it.
///
/// `Ok(None)` when nothing is there. Removing a map key keeps the order of the
/// remaining keys; removing an array element shifts the tail down.
pub fn delete(doc: &mut Value, path: &Path) -> Result<Option<Value>, PathError> {
    let (Some(last), Some(parent_path)) = (path.last(), path.parent()) else {
        return Err(PathError::InvalidPath(path.encode()));
    };
    let Some(parent) = get_mut(doc, &parent_path) else {
        return Ok(None);
    };

    match parent {
        Value::Object(map) => Ok(map.shift_remove(&last.as_key())),
        Value::Array(items) => match last {
            PathSegment::Index(i) if *i < items.len() => Ok(Some(items.remove(*i))),
            PathSegment::Index(i) => Err(PathError::IndexOutOfRange {
                path: path.encode(),
                index: *i,
                len: items.len(),
            }),
            PathSegment::Key(_) => Ok(None),
        },
        _ => Ok(None),
    }
}

/// Rename `old_key` to `new_key` in the object at `parent`.
///
/// Returns `false` if there is no object at `parent` or it lacks `old_key`.
/// An existing `new_key` is overwritten.
pub fn rename_key(doc: &mut Value, parent: &Path, old_key: &str, new_key: &str) -> bool {
    let Some(Value::Object(map)) = get_mut(doc, parent) else {
        return false;
    };
    match map.shift_remove(old_key) {
        Some(value) => {
            map.insert(new_key.to_string(), value);
            true
        }
        None => false,
    }
}

fn step<'a>(current: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(&segment.as_key()),
        Value::Array(items) => items.get(segment.as_index()?),
        _ => None,
    }
}

fn array_index(
    segment: &PathSegment,
    len: usize,
    path: &Path,
    depth: usize,
) -> Result<usize, PathError> {
    match segment {
        PathSegment::Index(i) if *i < len => Ok(*i),
        PathSegment::Index(i) => Err(PathError::IndexOutOfRange {
            path: prefix(path, depth),
            index: *i,
            len,
        }),
        PathSegment::Key(_) => Err(PathError::KeyOnArray {
            path: prefix(path, depth),
        }),
    }
}

/// Encoded form of the first `depth + 1` segments of `path`.
fn prefix(path: &Path, depth: usize) -> String {
    Path::from_segments(path.segments()[..=depth].iter().cloned()).encode()
}
