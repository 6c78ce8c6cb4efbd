//! Deciding whether two array elements are "the same element, edited".
//!
//! Generated API descriptions rarely keep element order stable, and a
//! correction usually touches one or two fields of a parameter or schema.
//! This module holds the only fuzzy logic in the engine: everything else is
//! exact content identity.

use serde_json::{Map, Value};
use specfix_types::{preview, Edit, Path};

use crate::config::ReconcileConfig;

/// Threshold test for pairing an added element with a removed one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldModificationHeuristic {
    key_overlap: f64,
    value_agreement: f64,
}

impl Default for FieldModificationHeuristic {
    fn default() -> Self {
        Self::new(&ReconcileConfig::default())
    }
}

impl FieldModificationHeuristic {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            key_overlap: config.key_overlap,
            value_agreement: config.value_agreement,
        }
    }

    /// Both values are maps that share enough keys to describe the same thing.
    ///
    /// Holds when at least one key is shared and the shared keys make up at
    /// least `key_overlap` of the larger map.
    pub fn shares_structure(&self, old: &Value, new: &Value) -> bool {
        match (old.as_object(), new.as_object()) {
            (Some(a), Some(b)) => self.overlap(a, b).is_some(),
            _ => false,
        }
    }

    /// [`shares_structure`](Self::shares_structure), and strictly more than
    /// `value_agreement` of the shared keys carry equal values.
    pub fn is_field_modification(&self, old: &Value, new: &Value) -> bool {
        let (Some(a), Some(b)) = (old.as_object(), new.as_object()) else {
            return false;
        };
        let Some(shared) = self.overlap(a, b) else {
            return false;
        };
        let equal = shared.iter().filter(|k| a.get(**k) == b.get(**k)).count();
        equal as f64 / shared.len() as f64 > self.value_agreement
    }

    /// Field-level edits turning `old` into `new`, rooted at `base`.
    ///
    /// Nested maps that still share structure are descended into; anything
    /// else that differs (lists included) is replaced whole. Returns nothing
    /// unless both values are maps.
    pub fn field_edits(&self, old: &Value, new: &Value, base: &Path) -> Vec<Edit> {
        let mut edits = Vec::new();
        if let (Some(a), Some(b)) = (old.as_object(), new.as_object()) {
            self.collect(a, b, base, &mut edits);
        }
        edits
    }

    fn collect(
        &self,
        old: &Map<String, Value>,
        new: &Map<String, Value>,
        base: &Path,
        out: &mut Vec<Edit>,
    ) {
        for (key, new_value) in new {
            let path = base.child(key.as_str());
            match old.get(key) {
                None => out.push(
                    Edit::add_if_missing(path, new_value.clone())
                        .with_description(format!("Add field '{key}': {}", preview(new_value))),
                ),
                Some(old_value) if old_value == new_value => {}
                Some(old_value) => match (old_value, new_value) {
                    (Value::Object(a), Value::Object(b)) if self.overlap(a, b).is_some() => {
                        self.collect(a, b, &path, out)
                    }
                    _ => out.push(
                        Edit::set_value(path, new_value.clone(), Some(old_value.clone()))
                            .with_description(format!("Update field '{key}': {}", preview(new_value))),
                    ),
                },
            }
        }
        for (key, old_value) in old {
            if !new.contains_key(key) {
                out.push(
                    Edit::delete_value(base.child(key.as_str()), Some(old_value.clone()))
                        .with_description(format!("Remove field '{key}'")),
                );
            }
        }
    }

    /// Shared keys, when they satisfy the overlap threshold.
    fn overlap<'a>(
        &self,
        a: &'a Map<String, Value>,
        b: &Map<String, Value>,
    ) -> Option<Vec<&'a String>> {
        let shared: Vec<&String> = a.keys().filter(|k| b.contains_key(*k)).collect();
        let required = self.key_overlap * a.len().max(b.len()) as f64;
        (!shared.is_empty() && shared.len() as f64 >= required).then_some(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use specfix_types::{path, EditKind, EditOp};

    fn heuristic() -> FieldModificationHeuristic {
        FieldModificationHeuristic::default()
    }

    #[test]
    fn one_changed_field_of_many_is_a_modification() {
        let old = json!({"name": "limit", "in": "query", "required": false, "type": "integer"});
        let new = json!({"name": "limit", "in": "query", "required": true, "type": "integer"});
        // 3 of 4 shared values agree: 0.75 > 0.7
        assert!(heuristic().is_field_modification(&old, &new));
    }

    #[test]
    fn half_agreement_is_not_enough() {
        let old = json!({"name": "p1", "format": "url"});
        let new = json!({"name": "p1", "format": "uri"});
        assert!(!heuristic().is_field_modification(&old, &new));
        assert!(heuristic().shares_structure(&old, &new));
    }

    #[test]
    fn exactly_seventy_percent_fails() {
        // 7 of 10 agree; the threshold is strict.
        let mut old = serde_json::Map::new();
        let mut new = serde_json::Map::new();
        for i in 0..10 {
            old.insert(format!("k{i}"), json!(i));
            new.insert(format!("k{i}"), json!(if i < 7 { i } else { -1 }));
        }
        assert!(!heuristic().is_field_modification(&Value::Object(old), &Value::Object(new)));
    }

    #[test]
    fn low_key_overlap_is_unrelated() {
        let old = json!({"a": 1, "b": 2, "c": 3, "d": 4});
        let new = json!({"a": 1, "x": 2, "y": 3, "z": 4});
        assert!(!heuristic().shares_structure(&old, &new));
        assert!(!heuristic().is_field_modification(&old, &new));
    }

    #[test]
    fn non_maps_and_empty_maps_never_match() {
        assert!(!heuristic().is_field_modification(&json!("a"), &json!("a")));
        assert!(!heuristic().is_field_modification(&json!([1]), &json!([1])));
        assert!(!heuristic().is_field_modification(&json!({}), &json!({})));
    }

    #[test]
    fn thresholds_come_from_config() {
        let lenient = FieldModificationHeuristic::new(&ReconcileConfig {
            value_agreement: 0.4,
            ..Default::default()
        });
        assert!(lenient.is_field_modification(
            &json!({"name": "p1", "format": "url"}),
            &json!({"name": "p1", "format": "uri"})
        ));
    }

    #[test]
    fn field_edits_cover_add_change_delete() {
        let old = json!({"name": "p1", "format": "url", "deprecated": true});
        let new = json!({"name": "p1", "format": "uri", "example": "https://x"});
        let edits = heuristic().field_edits(&old, &new, &path!["parameters", 0]);

        let summary: Vec<_> = edits.iter().map(|e| (e.kind(), e.path().encode())).collect();
        assert_eq!(
            summary,
            vec![
                (EditKind::SetValue, "parameters|0|format".to_string()),
                (EditKind::AddIfMissing, "parameters|0|example".to_string()),
                (EditKind::DeleteValue, "parameters|0|deprecated".to_string()),
            ]
        );
        assert_eq!(edits[0].description(), "Update field 'format': \"uri\"");
    }

    #[test]
    fn nested_maps_recurse_but_lists_do_not() {
        let old = json!({"schema": {"type": "string", "format": "url"}, "enum": [1, 2]});
        let new = json!({"schema": {"type": "string", "format": "uri"}, "enum": [2, 1]});
        let edits = heuristic().field_edits(&old, &new, &path!["ps", 1]);
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].path(), &path!["ps", 1, "schema", "format"]);
        assert_eq!(edits[1].path(), &path!["ps", 1, "enum"]);
        assert!(matches!(edits[1].op(), EditOp::SetValue { value, .. } if *value == json!([2, 1])));
    }

    #[test]
    fn unrelated_nested_maps_are_replaced() {
        let old = json!({"schema": {"a": 1}});
        let new = json!({"schema": {"b": 2}});
        let edits = heuristic().field_edits(&old, &new, &path!["xs", 0]);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].path(), &path!["xs", 0, "schema"]);
    }

    #[test]
    fn field_edits_on_scalars_is_empty() {
        assert!(heuristic().field_edits(&json!(1), &json!(2), &path!["a"]).is_empty());
    }
}
