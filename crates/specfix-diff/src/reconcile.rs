//! Array reconciliation: pairing the elements of two versions of an array.
//!
//! Elements are identified by content, not position. An element's identity is
//! its [`ContentHash`] plus its occurrence (how many identical elements come
//! before it), so duplicates pair up in order of appearance. Identities found
//! on only one side are then paired by the field-modification heuristic;
//! whatever is still unpaired becomes an add or a remove.

use std::collections::HashMap;

use serde_json::Value;
use specfix_crypto::ContentHasher;
use specfix_types::{ContentHash, Edit, ElementAnchor, Path};
use tracing::debug;

use crate::config::ReconcileConfig;
use crate::error::DiffResult;
use crate::heuristic::FieldModificationHeuristic;

/// `(hash, occurrence)`
type Identity = (ContentHash, usize);

/// Where an element of the old array ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// An identical element sits at this index of the new array.
    Kept(usize),
    /// The element was edited field by field into this new element.
    Modified(usize),
    /// The element was replaced whole by the new element at the same index.
    Replaced(usize),
    /// No counterpart in the new array.
    Removed,
}

impl Slot {
    /// Index in the new array, if the element has a counterpart.
    pub fn new_index(&self) -> Option<usize> {
        match *self {
            Self::Kept(i) | Self::Modified(i) | Self::Replaced(i) => Some(i),
            Self::Removed => None,
        }
    }
}

/// The result of reconciling two arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconciliation {
    /// One slot per element of the old array.
    pub mapping: Vec<Slot>,
    pub edits: Vec<Edit>,
}

impl Reconciliation {
    /// Returns `true` if the arrays hold the same elements in the same order.
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
            && self
                .mapping
                .iter()
                .enumerate()
                .all(|(i, slot)| *slot == Slot::Kept(i))
    }
}

/// Pairs old and new array elements and emits the edits between them.
#[derive(Clone, Debug)]
pub struct ArrayReconciler {
    heuristic: FieldModificationHeuristic,
    track_moves: bool,
}

impl Default for ArrayReconciler {
    fn default() -> Self {
        Self::new(&ReconcileConfig::default())
    }
}

impl ArrayReconciler {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            heuristic: FieldModificationHeuristic::new(config),
            track_moves: config.track_moves,
        }
    }

    pub fn heuristic(&self) -> &FieldModificationHeuristic {
        &self.heuristic
    }

    /// Reconcile `old` against `new`, the two versions of the array found at
    /// `array_path`.
    ///
    /// Edits come out grouped: field-level edits of paired elements first,
    /// then in-place replacements, additions, removals and moves.
    pub fn reconcile(
        &self,
        old: &[Value],
        new: &[Value],
        array_path: &Path,
    ) -> DiffResult<Reconciliation> {
        let hasher = ContentHasher::CONTENT;
        let old_hashes = hasher.hash_elements(old);
        let new_hashes = hasher.hash_elements(new);
        let old_ids = identities(&old_hashes);
        let new_ids = identities(&new_hashes);

        let new_positions: HashMap<Identity, usize> =
            new_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let old_positions: HashMap<Identity, usize> =
            old_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut mapping: Vec<Slot> = old_ids
            .iter()
            .map(|id| new_positions.get(id).map_or(Slot::Removed, |&i| Slot::Kept(i)))
            .collect();
        let added: Vec<usize> = (0..new.len())
            .filter(|i| !old_positions.contains_key(&new_ids[*i]))
            .collect();

        let mut field_edits = Vec::new();
        let mut replacements = Vec::new();

        // Cross-position pairing needs the full heuristic.
        let mut unpaired = Vec::new();
        for &ni in &added {
            let candidate = (0..old.len()).find(|&oi| {
                mapping[oi] == Slot::Removed
                    && self.heuristic.is_field_modification(&old[oi], &new[ni])
            });
            match candidate {
                Some(oi) => {
                    mapping[oi] = Slot::Modified(ni);
                    field_edits.extend(self.element_edits(
                        array_path,
                        oi,
                        old_ids[oi],
                        &old[oi],
                        &new[ni],
                    )?);
                }
                None => unpaired.push(ni),
            }
        }

        // An element that stayed in its slot only needs to resemble the old one.
        let mut additions = Vec::new();
        for ni in unpaired {
            if mapping.get(ni) != Some(&Slot::Removed) {
                additions.push(ni);
                continue;
            }
            let oi = ni;
            if self.heuristic.shares_structure(&old[oi], &new[ni]) {
                mapping[oi] = Slot::Modified(ni);
                field_edits.extend(self.element_edits(
                    array_path,
                    oi,
                    old_ids[oi],
                    &old[oi],
                    &new[ni],
                )?);
            } else {
                mapping[oi] = Slot::Replaced(ni);
                replacements.push(Edit::replace_array_item(
                    array_path,
                    ni,
                    old[oi].clone(),
                    new[ni].clone(),
                    old_hashes[oi],
                    new_hashes[ni],
                    new_ids[ni].1,
                ));
            }
        }

        let mut edits = field_edits;
        edits.append(&mut replacements);

        for &ni in &additions {
            let (hash, occurrence) = new_ids[ni];
            edits.push(Edit::add_array_item(array_path, ni, new[ni].clone(), hash, occurrence));
        }

        let mut removals = 0;
        for (oi, slot) in mapping.iter().enumerate() {
            if *slot == Slot::Removed {
                let hash = old_hashes[oi];
                let retain = new_hashes.iter().filter(|h| **h == hash).count();
                edits.push(Edit::remove_array_item(array_path, oi, old[oi].clone(), hash, retain));
                removals += 1;
            }
        }

        let mut moves = 0;
        if self.track_moves {
            for (oi, slot) in mapping.iter().enumerate() {
                if let Slot::Kept(ni) = *slot {
                    if oi != ni {
                        edits.push(Edit::move_array_item(array_path, oi, ni, &new[ni], old_hashes[oi]));
                        moves += 1;
                    }
                }
            }
        }

        debug!(
            array = %array_path,
            old_len = old.len(),
            new_len = new.len(),
            added = additions.len(),
            removed = removals,
            moved = moves,
            edits = edits.len(),
            "reconciled array"
        );

        Ok(Reconciliation { mapping, edits })
    }

    /// Field-level edits for a paired element, anchored to its old content.
    fn element_edits(
        &self,
        array_path: &Path,
        old_index: usize,
        (old_hash, occurrence): Identity,
        old: &Value,
        new: &Value,
    ) -> DiffResult<Vec<Edit>> {
        let anchor = ElementAnchor::with_occurrence(array_path.clone(), old_hash, occurrence);
        self.heuristic
            .field_edits(old, new, &array_path.child(old_index))
            .into_iter()
            .map(|edit| edit.with_anchor(anchor.clone()).map_err(Into::into))
            .collect()
    }
}

/// Pair each hash with the number of identical elements before it.
fn identities(hashes: &[ContentHash]) -> Vec<Identity> {
    let mut seen: HashMap<ContentHash, usize> = HashMap::new();
    hashes
        .iter()
        .map(|hash| {
            let count = seen.entry(*hash).or_insert(0);
            let id = (*hash, *count);
            *count += 1;
            id
        })
        .collect()
}
