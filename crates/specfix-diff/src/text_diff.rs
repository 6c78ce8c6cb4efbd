//! Line-level diff of two rendered documents.
//!
//! Used to show a reviewer where a patched document still differs from the
//! hand-corrected one. Both sides are rendered as pretty JSON with sorted
//! keys first, so key order never shows up as a difference. Uses the
//! `similar` crate (Myers diff algorithm) to produce hunks with context.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use similar::{ChangeTag, TextDiff};

/// Lines of unchanged context around each hunk.
const CONTEXT_LINES: usize = 3;

/// The result of diffing two texts line by line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentDiff {
    pub hunks: Vec<DiffHunk>,
    /// Total number of lines in the old text.
    pub old_lines: usize,
    /// Total number of lines in the new text.
    pub new_lines: usize,
}

impl DocumentDiff {
    /// Returns `true` if the two texts are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.lines()
            .filter(|l| matches!(l, DiffLine::Added(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines()
            .filter(|l| matches!(l, DiffLine::Removed(_)))
            .count()
    }

    /// Plain unified-diff rendering (`@@ -a,b +c,d @@` headers, one prefix
    /// character per line).
    pub fn unified(&self) -> String {
        let mut out = String::new();
        for hunk in &self.hunks {
            let _ = writeln!(out, "{}", hunk.header());
            for line in &hunk.lines {
                let _ = writeln!(out, "{line}");
            }
        }
        out
    }

    fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks.iter().flat_map(|h| &h.lines)
    }
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old text where this hunk starts (1-based).
    pub old_start: usize,
    pub old_count: usize,
    /// Line number in the new text where this hunk starts (1-based).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context(text) => write!(f, " {text}"),
            Self::Added(text) => write!(f, "+{text}"),
            Self::Removed(text) => write!(f, "-{text}"),
        }
    }
}

/// Diff the pretty renderings of two documents.
pub fn diff_rendered(old: &Value, new: &Value) -> DocumentDiff {
    diff_text(&render_sorted(old), &render_sorted(new))
}

/// Compute a line-by-line diff between two texts.
pub fn diff_text(old: &str, new: &str) -> DocumentDiff {
    let old_lines = old.lines().count();
    let new_lines = new.lines().count();
    if old == new {
        return DocumentDiff {
            hunks: Vec::new(),
            old_lines,
            new_lines,
        };
    }

    let text_diff = TextDiff::from_lines(old, new);
    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(CONTEXT_LINES) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };

        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
            }
        }
        hunks.push(hunk);
    }

    DocumentDiff {
        hunks,
        old_lines,
        new_lines,
    }
}

/// Two-space pretty JSON with every map's keys sorted.
pub fn render_sorted(value: &Value) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string_pretty(&sort_keys(value)).unwrap_or_default()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_texts_no_diff() {
        let diff = diff_text("a\nb\n", "a\nb\n");
        assert!(diff.is_empty());
        assert_eq!(diff.old_lines, 2);
        assert_eq!(diff.unified(), "");
    }

    #[test]
    fn single_line_change() {
        let diff = diff_text("one\ntwo\nthree\n", "one\n2\nthree\n");
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.deletions(), 1);
        assert_eq!(diff.hunks.len(), 1);
        assert_eq!(diff.hunks[0].header(), "@@ -1,3 +1,3 @@");
        assert_eq!(diff.unified(), "@@ -1,3 +1,3 @@\n one\n-two\n+2\n three\n");
    }

    #[test]
    fn key_order_is_not_a_difference() {
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": {"y": 2, "x": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": {"x": 3, "y": 2}, "b": 1}"#).unwrap();
        assert!(diff_rendered(&a, &b).is_empty());
    }

    #[test]
    fn rendered_value_change_is_located() {
        let old = json!({"parameters": [{"name": "p1", "format": "url"}]});
        let new = json!({"parameters": [{"name": "p1", "format": "uri"}]});
        let diff = diff_rendered(&old, &new);
        assert_eq!(diff.deletions(), 1);
        assert!(diff.unified().contains("-      \"format\": \"url\","));
        assert!(diff.unified().contains("+      \"format\": \"uri\","));
    }

    #[test]
    fn render_sorted_orders_keys() {
        let v: Value = serde_json::from_str(r#"{"z": 1, "a": 2}"#).unwrap();
        assert_eq!(render_sorted(&v), "{\n  \"a\": 2,\n  \"z\": 1\n}");
    }
}
