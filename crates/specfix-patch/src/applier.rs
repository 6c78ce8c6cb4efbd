//! Replaying an [`EditSet`] onto a document.
//!
//! Edits run in edit-set order against one mutable document. Whole array
//! elements are found by content hash and field edits inside elements by
//! their [`ElementAnchor`], so a regenerated document whose arrays come out
//! in a different order still receives every correction. Anything that no
//! longer fits is reported as skipped, which also makes a second run over
//! an already patched document a no-op.

use serde_json::{Map, Value};
use specfix_crypto::ContentHasher;
use specfix_types::{address, ContentHash, Edit, EditOp, EditSet, ElementAnchor, Path};
use tracing::debug;

use crate::error::PatchResult;
use crate::relocate::RelocationTable;
use crate::report::{Action, ApplyReport, EditOutcome, Outcome, SkipReason};

/// Applies edit sets to documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatchApplier;

impl PatchApplier {
    pub fn new() -> Self {
        Self
    }

    /// Apply every edit of `edits` to `doc` in place.
    ///
    /// Fails only when an edit addresses the document in a way that cannot
    /// work at all (deleting the root, indexing past the end of an array,
    /// descending into a scalar). Earlier edits stay applied in that case.
    pub fn apply(&self, doc: &mut Value, edits: &EditSet) -> PatchResult<ApplyReport> {
        let mut run = Run {
            doc,
            relocations: RelocationTable::default(),
        };
        let mut report = ApplyReport::default();

        for edit in edits {
            let outcome = run.apply(edit)?;
            debug!(path = %edit.path(), kind = %edit.kind(), %outcome, "edit processed");
            report.push(EditOutcome {
                path: edit.path().clone(),
                kind: edit.kind(),
                description: edit.description().to_string(),
                outcome,
            });
        }

        debug!(
            applied = report.applied_count(),
            skipped = report.skipped_count(),
            "patch complete"
        );
        Ok(report)
    }

    /// Apply `edits` to a copy of `doc`.
    pub fn patched(&self, doc: &Value, edits: &EditSet) -> PatchResult<(Value, ApplyReport)> {
        let mut copy = doc.clone();
        let report = self.apply(&mut copy, edits)?;
        Ok((copy, report))
    }
}

/// State of a single apply run.
struct Run<'a> {
    doc: &'a mut Value,
    relocations: RelocationTable,
}

impl Run<'_> {
    fn apply(&mut self, edit: &Edit) -> PatchResult<Outcome> {
        if let (Some(hash), Some((array_path, index))) = (edit.content_hash(), edit.element_target()) {
            if let Some(outcome) = self.apply_tracked(edit.op(), &array_path, index, hash) {
                return Ok(outcome);
            }
        }

        let path = match edit.anchor() {
            Some(anchor) => match self.resolve(edit, anchor) {
                Ok(path) => path,
                Err(reason) => return Ok(Outcome::Skipped(reason)),
            },
            None => edit.path().clone(),
        };
        self.apply_at(&path, edit.op())
    }

    /// Element-level edits located by content. `None` for kinds that are
    /// not element operations.
    fn apply_tracked(
        &mut self,
        op: &EditOp,
        array_path: &Path,
        index: usize,
        hash: ContentHash,
    ) -> Option<Outcome> {
        if !matches!(
            op,
            EditOp::AddArrayItem { .. }
                | EditOp::RemoveArrayItem { .. }
                | EditOp::SetValue { .. }
                | EditOp::MoveArrayItem { .. }
        ) {
            return None;
        }
        let Some(items) = address::get_mut(self.doc, array_path).and_then(Value::as_array_mut) else {
            return Some(Outcome::Skipped(SkipReason::ArrayNotFound));
        };
        let hashes = ContentHasher::CONTENT.hash_elements(items);
        self.relocations.observe(array_path, &hashes);
        let preferred = self.relocations.current(array_path, index);

        let outcome = match op {
            EditOp::AddArrayItem { value, occurrence } => {
                if count(&hashes, hash) > *occurrence {
                    Outcome::Skipped(SkipReason::AlreadyPresent)
                } else {
                    items.push(value.clone());
                    Outcome::Applied(Action::Appended)
                }
            }
            EditOp::RemoveArrayItem { retain, .. } => {
                match locate(&hashes, hash, preferred).filter(|_| count(&hashes, hash) > *retain) {
                    Some(position) => {
                        items.remove(position);
                        self.relocations.removed(array_path, position);
                        Outcome::Applied(Action::Removed)
                    }
                    None => Outcome::Skipped(SkipReason::ArrayItemNotFound),
                }
            }
            EditOp::SetValue {
                value,
                old_content_hash,
                occurrence,
                ..
            } => {
                if count(&hashes, hash) > *occurrence {
                    Outcome::Skipped(SkipReason::AlreadyCorrect)
                } else {
                    match old_content_hash.and_then(|old| locate(&hashes, old, preferred)) {
                        Some(position) => {
                            items[position] = value.clone();
                            Outcome::Applied(Action::Replaced)
                        }
                        None => Outcome::Skipped(SkipReason::ArrayItemNotFound),
                    }
                }
            }
            EditOp::MoveArrayItem { .. } => {
                if count(&hashes, hash) > 0 {
                    Outcome::Skipped(SkipReason::AlreadyInPosition)
                } else {
                    Outcome::Skipped(SkipReason::ArrayItemNotFound)
                }
            }
            _ => return None,
        };
        Some(outcome)
    }

    /// The concrete path of an anchored edit in the current document.
    ///
    /// Only the element the anchor names qualifies. An edit whose element
    /// is gone, including one already rewritten by an earlier run, is
    /// skipped.
    fn resolve(&mut self, edit: &Edit, anchor: &ElementAnchor) -> Result<Path, SkipReason> {
        let items = address::get(self.doc, anchor.array_path())
            .and_then(Value::as_array)
            .ok_or(SkipReason::ArrayNotFound)?;

        let index = self
            .relocations
            .locate(
                anchor.array_path(),
                || ContentHasher::CONTENT.hash_elements(items),
                anchor.element_hash(),
                anchor.occurrence(),
            )
            .filter(|&i| i < items.len())
            .ok_or(SkipReason::ArrayItemNotFound)?;

        Ok(edit.path().with_index_at(anchor.index_position(), index))
    }

    fn apply_at(&mut self, path: &Path, op: &EditOp) -> PatchResult<Outcome> {
        let outcome = match op {
            EditOp::SetValue { value, .. } => {
                let action = match address::get(self.doc, path) {
                    Some(current) if current == value => {
                        return Ok(Outcome::Skipped(SkipReason::AlreadyCorrect))
                    }
                    Some(_) => Action::Updated,
                    None => Action::Created,
                };
                address::set(self.doc, path, value.clone())?;
                Outcome::Applied(action)
            }
            EditOp::AddIfMissing { value } => {
                if address::exists(self.doc, path) {
                    Outcome::Skipped(SkipReason::AlreadyExists)
                } else {
                    address::set(self.doc, path, value.clone())?;
                    Outcome::Applied(Action::Added)
                }
            }
            EditOp::DeleteValue { .. } => match address::delete(self.doc, path)? {
                Some(_) => Outcome::Applied(Action::Deleted),
                None => Outcome::Skipped(SkipReason::NotFound),
            },
            EditOp::RenameKey { old_key, new_key } => {
                if address::rename_key(self.doc, path, old_key, new_key) {
                    Outcome::Applied(Action::Renamed)
                } else {
                    Outcome::Skipped(SkipReason::KeyNotFound)
                }
            }
            EditOp::ModifyArrayElement {
                match_criteria,
                modifications,
            } => modify_element(self.doc, path, match_criteria, modifications),
            // Array edits without a content hash treat the path as the array.
            EditOp::AddArrayItem { value, .. } => match array_mut(self.doc, path) {
                Some(items) if items.contains(value) => Outcome::Skipped(SkipReason::AlreadyPresent),
                Some(items) => {
                    items.push(value.clone());
                    Outcome::Applied(Action::Appended)
                }
                None => Outcome::Skipped(SkipReason::ArrayNotFound),
            },
            EditOp::RemoveArrayItem { value, .. } => match array_mut(self.doc, path) {
                Some(items) => match value.as_ref().and_then(|v| items.iter().position(|item| item == v)) {
                    Some(position) => {
                        items.remove(position);
                        self.relocations.removed(path, position);
                        Outcome::Applied(Action::Removed)
                    }
                    None => Outcome::Skipped(SkipReason::ArrayItemNotFound),
                },
                None => Outcome::Skipped(SkipReason::ArrayNotFound),
            },
            EditOp::MoveArrayItem { .. } => Outcome::Skipped(SkipReason::Untracked),
        };
        Ok(outcome)
    }
}

fn array_mut<'a>(doc: &'a mut Value, path: &Path) -> Option<&'a mut Vec<Value>> {
    address::get_mut(doc, path).and_then(Value::as_array_mut)
}

fn count(hashes: &[ContentHash], hash: ContentHash) -> usize {
    hashes.iter().filter(|h| **h == hash).count()
}

/// Index of an element with `hash`, preferring `preferred` when it matches.
fn locate(hashes: &[ContentHash], hash: ContentHash, preferred: Option<usize>) -> Option<usize> {
    preferred
        .filter(|&i| hashes.get(i) == Some(&hash))
        .or_else(|| hashes.iter().position(|h| *h == hash))
}

fn modify_element(
    doc: &mut Value,
    path: &Path,
    criteria: &Map<String, Value>,
    modifications: &Map<String, Value>,
) -> Outcome {
    let element = array_mut(doc, path).and_then(|items| {
        items
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|element| criteria.iter().all(|(k, v)| element.get(k) == Some(v)))
    });
    let Some(element) = element else {
        return Outcome::Skipped(SkipReason::NoMatchingElement);
    };
    if modifications.iter().all(|(k, v)| element.get(k) == Some(v)) {
        return Outcome::Skipped(SkipReason::AlreadyCorrect);
    }
    for (key, value) in modifications {
        element.insert(key.clone(), value.clone());
    }
    Outcome::Applied(Action::Modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatchError;
    use proptest::prelude::*;
    use serde_json::json;
    use specfix_crypto::{content_hash, to_canonical_string};
    use specfix_diff::diff_documents;
    use specfix_types::{path, PathError};

    fn apply(doc: &mut Value, edits: Vec<Edit>) -> ApplyReport {
        PatchApplier::new()
            .apply(doc, &EditSet::from_edits(edits))
            .unwrap()
    }

    fn outcomes(report: &ApplyReport) -> Vec<Outcome> {
        report.outcomes.iter().map(|o| o.outcome).collect()
    }

    fn edit_set(old: &Value, new: &Value) -> EditSet {
        EditSet::from_edits(diff_documents(old, new).unwrap())
    }

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets"},
            "paths": {"/pets": {"get": {
                "parameters": [
                    {"name": "limit", "in": "query", "format": "url"},
                    {"name": "offset", "in": "query"}
                ],
                "tags": ["pets", "legacy"]
            }}}
        })
    }

    fn corrected() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Pet Store"},
            "paths": {"/pets": {"get": {
                "parameters": [
                    {"name": "limit", "in": "query", "format": "uri"},
                    {"name": "offset", "in": "query"}
                ],
                "tags": ["pets", "store"]
            }}},
            "servers": [{"url": "https://pets.example"}]
        })
    }

    #[test]
    fn set_value_creates_updates_and_skips() {
        let mut doc = json!({"info": {"title": "a"}});
        let report = apply(
            &mut doc,
            vec![
                Edit::set_value(path!["info", "title"], json!("b"), Some(json!("a"))),
                Edit::set_value(path!["info", "version"], json!("1.0"), None),
            ],
        );
        assert_eq!(
            outcomes(&report),
            vec![
                Outcome::Applied(Action::Updated),
                Outcome::Applied(Action::Created),
            ]
        );
        assert_eq!(doc, json!({"info": {"title": "b", "version": "1.0"}}));

        let report = apply(&mut doc, vec![Edit::set_value(path!["info", "title"], json!("b"), None)]);
        assert_eq!(outcomes(&report), vec![Outcome::Skipped(SkipReason::AlreadyCorrect)]);
    }

    #[test]
    fn add_if_missing_never_overwrites() {
        let mut doc = json!({"a": null});
        let report = apply(
            &mut doc,
            vec![
                Edit::add_if_missing(path!["a"], json!(1)),
                Edit::add_if_missing(path!["b", "c"], json!(2)),
            ],
        );
        assert_eq!(
            outcomes(&report),
            vec![
                Outcome::Skipped(SkipReason::AlreadyExists),
                Outcome::Applied(Action::Added),
            ]
        );
        assert_eq!(doc, json!({"a": null, "b": {"c": 2}}));
    }

    #[test]
    fn delete_value_outcomes() {
        let mut doc = json!({"a": 1, "b": 2});
        let report = apply(
            &mut doc,
            vec![
                Edit::delete_value(path!["a"], Some(json!(1))),
                Edit::delete_value(path!["zzz"], None),
            ],
        );
        assert_eq!(
            outcomes(&report),
            vec![
                Outcome::Applied(Action::Deleted),
                Outcome::Skipped(SkipReason::NotFound),
            ]
        );
        assert_eq!(doc, json!({"b": 2}));
    }

    #[test]
    fn deleting_the_root_aborts() {
        let mut doc = json!({"a": 1});
        let set = EditSet::from_edits([Edit::delete_value(Path::root(), None)]);
        let err = PatchApplier::new().apply(&mut doc, &set).unwrap_err();
        assert!(matches!(err, PatchError::Path(PathError::InvalidPath(_))));
    }

    #[test]
    fn out_of_range_index_aborts() {
        let mut doc = json!({"xs": [{"a": 1}]});
        let set = EditSet::from_edits([Edit::set_value(path!["xs", 5, "a"], json!(2), None)]);
        let err = PatchApplier::new().apply(&mut doc, &set).unwrap_err();
        assert!(matches!(
            err,
            PatchError::Path(PathError::IndexOutOfRange { index: 5, len: 1, .. })
        ));
    }

    #[test]
    fn rename_applies_once() {
        let mut doc = json!({"test": {"a": 1}});
        let edits = || vec![Edit::rename_key(path!["test"], "a", "b")];
        let report = apply(&mut doc, edits());
        assert_eq!(outcomes(&report), vec![Outcome::Applied(Action::Renamed)]);
        assert_eq!(doc, json!({"test": {"b": 1}}));

        let report = apply(&mut doc, edits());
        assert_eq!(outcomes(&report), vec![Outcome::Skipped(SkipReason::KeyNotFound)]);
        assert_eq!(
            report.skipped().collect::<Vec<_>>(),
            vec!["skipped: key not found: Rename \"a\" to \"b\" at test"]
        );
    }

    #[test]
    fn modify_array_element_outcomes() {
        let mut doc = json!({"params": [{"name": "a"}, "scalar", {"name": "b", "in": "query"}]});
        let criteria = |name: &str| {
            let mut m = Map::new();
            m.insert("name".into(), json!(name));
            m
        };
        let mut mods = Map::new();
        mods.insert("required".into(), json!(true));

        let edit = |name: &str| Edit::modify_array_element(path!["params"], criteria(name), mods.clone());
        let report = apply(&mut doc, vec![edit("b")]);
        assert_eq!(outcomes(&report), vec![Outcome::Applied(Action::Modified)]);
        assert_eq!(doc["params"][2]["required"], json!(true));

        let report = apply(&mut doc, vec![edit("b")]);
        assert_eq!(outcomes(&report), vec![Outcome::Skipped(SkipReason::AlreadyCorrect)]);

        let report = apply(&mut doc, vec![edit("zzz")]);
        assert_eq!(outcomes(&report), vec![Outcome::Skipped(SkipReason::NoMatchingElement)]);

        let missing = Edit::modify_array_element(path!["nope"], criteria("b"), mods.clone());
        let report = apply(&mut doc, vec![missing]);
        assert_eq!(outcomes(&report), vec![Outcome::Skipped(SkipReason::NoMatchingElement)]);
    }

    #[test]
    fn diff_then_patch_reproduces_the_correction() {
        let set = edit_set(&petstore(), &corrected());
        let (patched, report) = PatchApplier::new().patched(&petstore(), &set).unwrap();
        assert_eq!(patched, corrected());
        assert_eq!(report.skipped_count(), 0);
        assert!(set.contains_path(&path!["paths", "/pets", "get", "parameters", 0, "format"]));
    }

    #[test]
    fn second_pass_changes_nothing() {
        let set = edit_set(&petstore(), &corrected());
        let mut doc = petstore();
        let applier = PatchApplier::new();
        applier.apply(&mut doc, &set).unwrap();

        let report = applier.apply(&mut doc, &set).unwrap();
        assert!(report.is_noop());
        assert_eq!(report.skipped_count(), set.len());
        assert_eq!(doc, corrected());
    }

    #[test]
    fn anchored_edit_follows_reordered_element() {
        let set = edit_set(&petstore(), &corrected());
        let mut regenerated = petstore();
        regenerated["paths"]["/pets"]["get"]["parameters"] = json!([
            {"name": "offset", "in": "query"},
            {"name": "limit", "in": "query", "format": "url"}
        ]);

        PatchApplier::new().apply(&mut regenerated, &set).unwrap();
        let params = &regenerated["paths"]["/pets"]["get"]["parameters"];
        assert_eq!(params[0], json!({"name": "offset", "in": "query"}));
        assert_eq!(params[1]["format"], "uri");
    }

    #[test]
    fn several_field_edits_on_one_moved_element() {
        let old = json!({"ps": [
            {"name": "other", "in": "path"},
            {"name": "p", "in": "query", "type": "string", "format": "url", "required": false}
        ]});
        let new = json!({"ps": [
            {"name": "other", "in": "path"},
            {"name": "p", "in": "query", "type": "string", "format": "uri", "required": true}
        ]});
        let set = edit_set(&old, &new);
        assert_eq!(set.len(), 2);

        let mut regenerated = json!({"ps": [
            {"name": "p", "in": "query", "type": "string", "format": "url", "required": false},
            {"name": "other", "in": "path"}
        ]});
        let report = PatchApplier::new().apply(&mut regenerated, &set).unwrap();
        assert_eq!(report.applied_count(), 2);
        assert_eq!(regenerated["ps"][0]["format"], "uri");
        assert_eq!(regenerated["ps"][0]["required"], true);
        assert_eq!(regenerated["ps"][1], json!({"name": "other", "in": "path"}));
    }

    #[test]
    fn field_edit_after_removal_shifts() {
        let element = json!({"name": "e", "in": "q", "type": "s", "required": false});
        let mut edited = element.clone();
        edited["required"] = json!(true);
        let old = json!({"xs": ["gone", element]});
        let new = json!({"xs": [edited]});

        let set = edit_set(&old, &new);
        let (patched, report) = PatchApplier::new().patched(&old, &set).unwrap();
        assert_eq!(patched, new);
        assert_eq!(report.applied_count(), 2);
    }

    #[test]
    fn duplicate_removals_respect_retain() {
        let old = json!({"xs": ["a", "a", "a", "b"]});
        let new = json!({"xs": ["a", "b"]});
        let set = edit_set(&old, &new);
        let mut doc = old.clone();
        PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert_eq!(doc, new);
        assert!(PatchApplier::new().apply(&mut doc, &set).unwrap().is_noop());
        assert_eq!(doc, new);
    }

    #[test]
    fn replacement_among_duplicates_is_idempotent() {
        let old = json!({"xs": ["a", "a"]});
        let new = json!({"xs": ["a", "b"]});
        let set = edit_set(&old, &new);
        let mut doc = old.clone();
        PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert_eq!(doc, new);

        let report = PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert_eq!(outcomes(&report), vec![Outcome::Skipped(SkipReason::AlreadyCorrect)]);
        assert_eq!(doc, new);
    }

    #[test]
    fn unmatched_tracked_edits_are_skipped() {
        let mut doc = json!({"xs": ["z"]});
        let report = apply(
            &mut doc,
            vec![
                Edit::remove_array_item(&path!["xs"], 0, json!("a"), content_hash(&json!("a")), 0),
                Edit::add_array_item(&path!["ys"], 0, json!("a"), content_hash(&json!("a")), 0),
                Edit::move_array_item(&path!["xs"], 2, 0, &json!("q"), content_hash(&json!("q"))),
            ],
        );
        assert_eq!(
            outcomes(&report),
            vec![
                Outcome::Skipped(SkipReason::ArrayItemNotFound),
                Outcome::Skipped(SkipReason::ArrayItemNotFound),
                Outcome::Skipped(SkipReason::ArrayNotFound),
            ]
        );
        assert_eq!(doc, json!({"xs": ["z"]}));
    }

    #[test]
    fn tracked_add_appends_once() {
        let mut doc = json!({"tags": ["a"]});
        let add = || vec![Edit::add_array_item(&path!["tags"], 0, json!("c"), content_hash(&json!("c")), 0)];
        assert_eq!(outcomes(&apply(&mut doc, add())), vec![Outcome::Applied(Action::Appended)]);
        assert_eq!(outcomes(&apply(&mut doc, add())), vec![Outcome::Skipped(SkipReason::AlreadyPresent)]);
        assert_eq!(doc, json!({"tags": ["a", "c"]}));
    }

    #[test]
    fn moves_never_mutate() {
        let mut doc = json!({"xs": ["a", "b"]});
        let report = apply(
            &mut doc,
            vec![Edit::move_array_item(&path!["xs"], 0, 1, &json!("a"), content_hash(&json!("a")))],
        );
        assert_eq!(outcomes(&report), vec![Outcome::Skipped(SkipReason::AlreadyInPosition)]);
        assert_eq!(doc, json!({"xs": ["a", "b"]}));
    }

    #[test]
    fn untracked_array_edits_use_the_path_as_array() {
        let wire = json!({
            "version": "3.0",
            "operations": [
                {"type": "add_array_item", "path": "tags", "value": "new"},
                {"type": "remove_array_item", "path": "tags", "value": "old"},
                {"type": "move_array_item", "path": "tags"}
            ]
        });
        let set: EditSet = serde_json::from_value(wire).unwrap();
        let mut doc = json!({"tags": ["old", "keep"]});
        let report = PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert_eq!(
            outcomes(&report),
            vec![
                Outcome::Applied(Action::Appended),
                Outcome::Applied(Action::Removed),
                Outcome::Skipped(SkipReason::Untracked),
            ]
        );
        assert_eq!(doc, json!({"tags": ["keep", "new"]}));
    }

    #[test]
    fn anchored_edit_without_its_element_is_skipped() {
        let set = edit_set(&petstore(), &corrected());
        let mut regenerated = petstore();
        regenerated["paths"]["/pets"]["get"]["parameters"] = json!([{"name": "page", "in": "query"}]);
        let report = PatchApplier::new().apply(&mut regenerated, &set).unwrap();
        let format = report
            .outcomes
            .iter()
            .find(|o| o.path.encode().ends_with("format"))
            .unwrap();
        assert_eq!(format.outcome, Outcome::Skipped(SkipReason::ArrayItemNotFound));
        assert_eq!(
            regenerated["paths"]["/pets"]["get"]["parameters"],
            json!([{"name": "page", "in": "query"}])
        );
    }

    #[test]
    fn identical_elements_receive_their_own_field_edits() {
        let old = json!({"xs": [
            {"a": 1, "b": 1, "c": 1, "d": 1},
            {"a": 1, "b": 1, "c": 1, "d": 1}
        ]});
        let new = json!({"xs": [
            {"a": 1, "b": 1, "c": 1, "d": 2},
            {"a": 1, "b": 1, "c": 1, "d": 3}
        ]});
        let set = edit_set(&old, &new);
        let mut doc = old.clone();
        PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert_eq!(doc, new);

        assert!(PatchApplier::new().apply(&mut doc, &set).unwrap().is_noop());
        assert_eq!(doc, new);
    }

    #[test]
    fn second_pass_leaves_appended_elements_alone() {
        let param = |name: u8, r#in: u8, ty: u8, req: u8| json!({"name": name, "in": r#in, "type": ty, "req": req});
        let old = json!({"xs": [param(0, 0, 1, 0), param(0, 0, 1, 1), param(0, 1, 1, 0)]});
        let new = json!({"xs": [param(1, 1, 0, 0), param(0, 0, 1, 0), param(0, 0, 0, 0)]});
        let set = edit_set(&old, &new);
        let mut doc = old.clone();
        PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert_eq!(sorted(&doc), sorted(&new));

        let patched = doc.clone();
        let report = PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert!(report.is_noop(), "{:?}", report.applied().collect::<Vec<_>>());
        assert_eq!(doc, patched);
    }

    #[test]
    fn replacement_does_not_shift_anchors_of_identical_elements() {
        let element = json!({"a": 1, "b": 1, "c": 1, "d": 1});
        let reshaped = json!({"a": 1, "b": 2, "c": 2, "d": 2});
        let old = json!({"xs": [element, element]});
        let new = json!({"xs": ["s", reshaped]});
        let set = edit_set(&old, &new);
        assert!(set.iter().any(|e| e.anchor().is_some_and(|a| a.occurrence() == 1)));

        let (patched, report) = PatchApplier::new().patched(&old, &set).unwrap();
        assert_eq!(patched, new);
        assert_eq!(report.skipped_count(), 0);
    }

    #[test]
    fn removals_do_not_take_an_anchored_copy() {
        let element = json!({"a": 1, "b": 1, "c": 1, "d": 1});
        let reshaped = json!({"a": 1, "b": 2, "c": 2, "d": 2});
        let old = json!({"xs": [element, element, element, "k1", "k2"]});
        let new = json!({"xs": ["k1", "k2", reshaped]});
        let set = edit_set(&old, &new);

        let mut doc = old.clone();
        PatchApplier::new().apply(&mut doc, &set).unwrap();
        assert_eq!(sorted(&doc), sorted(&new));
        assert!(PatchApplier::new().apply(&mut doc, &set).unwrap().is_noop());
    }

    fn sorted(value: &Value) -> Vec<String> {
        let mut items: Vec<String> = value["xs"]
            .as_array()
            .unwrap()
            .iter()
            .map(to_canonical_string)
            .collect();
        items.sort();
        items
    }

    proptest! {
        #[test]
        fn patched_array_holds_the_corrected_elements(
            old in prop::collection::vec("[a-d]", 0..6),
            new in prop::collection::vec("[a-d]", 0..6),
        ) {
            let old = json!({"xs": old});
            let new = json!({"xs": new});
            let set = edit_set(&old, &new);
            let applier = PatchApplier::new();

            let (mut patched, _) = applier.patched(&old, &set).unwrap();
            prop_assert_eq!(sorted(&patched), sorted(&new));

            let again = applier.apply(&mut patched, &set).unwrap();
            prop_assert!(again.is_noop());
        }

        #[test]
        fn patched_object_array_holds_the_corrected_elements(
            old in prop::collection::vec(prop::collection::btree_map("[a-d]", 0..2u8, 1..4), 0..5),
            new in prop::collection::vec(prop::collection::btree_map("[a-d]", 0..2u8, 1..4), 0..5),
        ) {
            let old = json!({"xs": old});
            let new = json!({"xs": new});
            let set = edit_set(&old, &new);
            let applier = PatchApplier::new();

            let (mut patched, _) = applier.patched(&old, &set).unwrap();
            prop_assert_eq!(sorted(&patched), sorted(&new));

            let again = applier.apply(&mut patched, &set).unwrap();
            prop_assert!(again.is_noop(), "{:?}", again.applied().collect::<Vec<_>>());
        }
    }
}
