use std::collections::HashMap;

use specfix_types::{ContentHash, Path};

/// `(hash, occurrence)`
type Identity = (ContentHash, usize);

/// Where the elements of each array sit during the current run.
///
/// An array is snapshotted the first time any tracked edit touches it,
/// before anything in it changes. Recorded indices and anchors both refer
/// to that first state; field edits change hashes and removals shift
/// positions, so they are resolved through the snapshot rather than the
/// live array.
#[derive(Debug, Default)]
pub(crate) struct RelocationTable {
    arrays: HashMap<Path, Snapshot>,
}

#[derive(Debug)]
struct Snapshot {
    /// Identity to index at snapshot time.
    origins: HashMap<Identity, usize>,
    /// Index at snapshot time to current index; `None` once removed.
    positions: Vec<Option<usize>>,
}

impl Snapshot {
    fn new(hashes: &[ContentHash]) -> Self {
        let mut seen: HashMap<ContentHash, usize> = HashMap::new();
        let origins = hashes
            .iter()
            .enumerate()
            .map(|(index, hash)| {
                let count = seen.entry(*hash).or_insert(0);
                let id = (*hash, *count);
                *count += 1;
                (id, index)
            })
            .collect();
        Self {
            origins,
            positions: (0..hashes.len()).map(Some).collect(),
        }
    }
}

impl RelocationTable {
    /// Snapshot the array at `array_path` unless it was seen before.
    pub(crate) fn observe(&mut self, array_path: &Path, hashes: &[ContentHash]) {
        if !self.arrays.contains_key(array_path) {
            self.arrays.insert(array_path.clone(), Snapshot::new(hashes));
        }
    }

    /// Current index of the element that sat at `original` when the array
    /// was first seen.
    pub(crate) fn current(&self, array_path: &Path, original: usize) -> Option<usize> {
        self.arrays
            .get(array_path)
            .and_then(|snapshot| snapshot.positions.get(original).copied().flatten())
    }

    /// Current index of the `occurrence`-th element hashing to `hash` when
    /// the array was first seen. `hashes` are only read on first sight.
    pub(crate) fn locate(
        &mut self,
        array_path: &Path,
        hashes: impl FnOnce() -> Vec<ContentHash>,
        hash: ContentHash,
        occurrence: usize,
    ) -> Option<usize> {
        let snapshot = self
            .arrays
            .entry(array_path.clone())
            .or_insert_with(|| Snapshot::new(&hashes()));
        let origin = *snapshot.origins.get(&(hash, occurrence))?;
        snapshot.positions[origin]
    }

    /// Forget the element now at `index` and shift everything after it down.
    pub(crate) fn removed(&mut self, array_path: &Path, index: usize) {
        let Some(snapshot) = self.arrays.get_mut(array_path) else {
            return;
        };
        for position in &mut snapshot.positions {
            *position = match *position {
                Some(p) if p == index => None,
                Some(p) if p > index => Some(p - 1),
                other => other,
            };
        }
    }
}
