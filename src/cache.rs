//! Branch cache: the only mutable, heap-retained state a tree instance owns.
//!
//! Invariant: an entry exists at `(level, index)` iff the subtree rooted
//! there currently has at least one set leaf. Insert/delete propagation in
//! `tree` is responsible for upholding this; the cache itself just stores
//! whatever it is told to.

use crate::hash::Digest;
use fnv::FnvHashMap;

/// Composite cache key: `[level:1 byte][index:8 bytes big-endian]`, chosen so
/// that lexicographic ordering of the packed key groups entries by level
/// then by index — useful if a cache is ever serialised or range-scanned,
/// though no operation in this crate requires that ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct BranchKey {
    level: u8,
    index: u64,
}

impl BranchKey {
    fn new(level: u8, index: u64) -> Self {
        Self { level, index }
    }
}

/// Flat map from `(level, index)` to the branch hash at that position.
///
/// A single concrete struct, not a trait object: the specification calls for
/// exactly one caching strategy, and dynamic dispatch over a "cache
/// interface" buys nothing here (see the reference implementation's unused
/// `CSMTLevel`/cache-interface indirection).
#[derive(Debug, Default, Clone)]
pub struct BranchCache {
    entries: FnvHashMap<BranchKey, Digest>,
}

impl BranchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff an entry exists at `(level, index)`.
    pub fn exists(&self, level: u8, index: u64) -> bool {
        self.entries.contains_key(&BranchKey::new(level, index))
    }

    /// Returns the hash stored at `(level, index)`, or `Digest::NIL` if absent.
    pub fn get(&self, level: u8, index: u64) -> Digest {
        self.entries
            .get(&BranchKey::new(level, index))
            .copied()
            .unwrap_or(Digest::NIL)
    }

    /// Unconditionally writes `hash` at `(level, index)`.
    pub fn insert(&mut self, level: u8, index: u64, hash: Digest) {
        self.entries.insert(BranchKey::new(level, index), hash);
    }

    /// If `hash` is nil, deletes the entry at `(level, index)` and returns
    /// `Digest::NIL`; otherwise writes `hash` and returns it. This is the
    /// policy that must be used whenever a node's recomputed hash might have
    /// become nil (i.e. all of that subtree's leaves were removed) — writing
    /// a nil hash unconditionally would violate the sparsity invariant.
    pub fn update_and_store(&mut self, level: u8, index: u64, hash: Digest) -> Digest {
        if hash.is_nil() {
            self.delete(level, index);
            Digest::NIL
        } else {
            self.insert(level, index, hash);
            hash
        }
    }

    /// Removes the entry at `(level, index)`, returning whether it existed.
    pub fn delete(&mut self, level: u8, index: u64) -> bool {
        self.entries.remove(&BranchKey::new(level, index)).is_some()
    }

    /// Number of live entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_entry_reads_as_nil() {
        let cache = BranchCache::new();
        assert!(!cache.exists(3, 7));
        assert!(cache.get(3, 7).is_nil());
    }

    #[test]
    fn insert_then_get_roundtrips() {
        let mut cache = BranchCache::new();
        let h = crate::hash::leaf_hash(&[0xAB]);
        cache.insert(0, 42, h);
        assert!(cache.exists(0, 42));
        assert_eq!(cache.get(0, 42), h);
    }

    #[test]
    fn update_and_store_nil_deletes() {
        let mut cache = BranchCache::new();
        let h = crate::hash::leaf_hash(&[0x01]);
        cache.insert(1, 1, h);
        let result = cache.update_and_store(1, 1, Digest::NIL);
        assert!(result.is_nil());
        assert!(!cache.exists(1, 1));
    }

    #[test]
    fn update_and_store_non_nil_writes() {
        let mut cache = BranchCache::new();
        let h = crate::hash::leaf_hash(&[0x02]);
        let result = cache.update_and_store(2, 5, h);
        assert_eq!(result, h);
        assert_eq!(cache.get(2, 5), h);
    }

    #[test]
    fn delete_reports_previous_existence() {
        let mut cache = BranchCache::new();
        assert!(!cache.delete(0, 1));
        cache.insert(0, 1, crate::hash::leaf_hash(&[0x03]));
        assert!(cache.delete(0, 1));
        assert!(!cache.exists(0, 1));
    }

    #[test]
    fn different_levels_do_not_collide_on_same_index() {
        let mut cache = BranchCache::new();
        let a = crate::hash::leaf_hash(&[0x01]);
        let b = crate::hash::leaf_hash(&[0x02]);
        cache.insert(0, 5, a);
        cache.insert(1, 5, b);
        assert_eq!(cache.get(0, 5), a);
        assert_eq!(cache.get(1, 5), b);
        assert_eq!(cache.len(), 2);
    }
}
