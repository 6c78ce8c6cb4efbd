//! Typed addresses into a JSON document.
//!
//! A [`Path`] is an ordered list of [`PathSegment`]s. Its persisted form joins
//! the segments with `|` and escapes key text so that any key round-trips:
//!
//! | in key | encoded |
//! |--------|---------|
//! | `~`    | `~0`    |
//! | `\|`   | `~1`    |
//! | empty key (whole segment) | `~2` |
//!
//! The empty string is the root path. Keys that are canonical decimal
//! integers are stored as [`PathSegment::Index`]; the container decides at
//! resolution time whether the segment is an array index or a map key such as
//! an OpenAPI response code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathError;

/// Separator between encoded segments.
pub const DELIMITER: char = '|';

const ESCAPE: char = '~';
const EMPTY_KEY: &str = "~2";

/// One step of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// An array index, or a map key spelled as a canonical decimal integer.
    Index(usize),
    /// A map key.
    Key(String),
}

impl PathSegment {
    /// Build a key segment, normalizing canonical decimal keys to `Index`.
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        match canonical_index(&key) {
            Some(index) => Self::Index(index),
            None => Self::Key(key),
        }
    }

    /// The map key this segment addresses when applied to an object.
    pub fn as_key(&self) -> String {
        match self {
            Self::Index(i) => i.to_string(),
            Self::Key(k) => k.clone(),
        }
    }

    /// The array index this segment addresses, if any.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(_) => None,
        }
    }

    fn encode_into(&self, out: &mut String) {
        match self {
            Self::Index(i) => out.push_str(&i.to_string()),
            Self::Key(k) if k.is_empty() => out.push_str(EMPTY_KEY),
            Self::Key(k) => {
                for c in k.chars() {
                    match c {
                        ESCAPE => out.push_str("~0"),
                        DELIMITER => out.push_str("~1"),
                        other => out.push(other),
                    }
                }
            }
        }
    }

    fn decode(raw: &str) -> Result<Self, PathError> {
        if raw == EMPTY_KEY {
            return Ok(Self::Key(String::new()));
        }
        if !raw.contains(ESCAPE) {
            return Ok(Self::key(raw));
        }

        let mut key = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != ESCAPE {
                key.push(c);
                continue;
            }
            match chars.next() {
                Some('0') => key.push(ESCAPE),
                Some('1') => key.push(DELIMITER),
                _ => return Err(PathError::InvalidEscape(raw.to_string())),
            }
        }
        Ok(Self::key(key))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.encode_into(&mut out);
        f.write_str(&out)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::key(key)
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::key(key)
    }
}

/// `Some(n)` if `s` is the canonical decimal spelling of `n` (no sign, no
/// leading zeros).
fn canonical_index(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    s.parse().ok()
}

/// A location inside a document, relative to its root.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Parse the `|`-delimited persisted form.
    pub fn parse(encoded: &str) -> Result<Self, PathError> {
        if encoded.is_empty() {
            return Ok(Self::root());
        }
        encoded
            .split(DELIMITER)
            .map(PathSegment::decode)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// The persisted form; inverse of [`Path::parse`].
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            segment.encode_into(&mut out);
        }
        out
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last segment, or `None` for the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The path without its last segment, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    /// A new path extended by one segment.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Path {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// A new path with `suffix` appended.
    pub fn join(&self, suffix: &[PathSegment]) -> Path {
        let mut segments = self.0.clone();
        segments.extend_from_slice(suffix);
        Self(segments)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// A copy of this path whose segment at `position` is replaced by `index`.
    pub fn with_index_at(&self, position: usize, index: usize) -> Path {
        let mut segments = self.0.clone();
        if let Some(slot) = segments.get_mut(position) {
            *slot = PathSegment::Index(index);
        }
        Self(segments)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.encode())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.encode())
        }
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::parse(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Build a [`Path`] from a list of keys and indices.
///
/// ```
/// use specfix_types::path;
/// let p = path!["parameters", 0, "format"];
/// assert_eq!(p.encode(), "parameters|0|format");
/// ```
#[macro_export]
macro_rules! path {
    () => { $crate::Path::root() };
    ($($segment:expr),+ $(,)?) => {
        $crate::Path::from_segments([$($crate::PathSegment::from($segment)),+])
    };
}
