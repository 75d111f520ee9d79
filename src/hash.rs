//! Hashing primitives for the compact sparse Merkle tree.
//!
//! The tree is sparse: an empty subtree never materialises a sentinel hash.
//! `Digest` distinguishes "no hash" from every real 32-byte hash so the
//! internal hash rule (see `node_hash`) can special-case empty children
//! without ever hashing a zero-filled placeholder.

use sha2::{Digest as _, Sha512_256};
use std::fmt;

/// A 32-byte SHA-512/256 digest, or the absence of one ("empty subtree").
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Digest(pub Option<[u8; 32]>);

impl Digest {
    pub const NIL: Digest = Digest(None);

    pub fn is_nil(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_bytes(&self) -> Option<&[u8; 32]> {
        self.0.as_ref()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(bytes) => write!(f, "Digest({})", hex::encode(bytes)),
            None => write!(f, "Digest(nil)"),
        }
    }
}

/// Hashes a leaf value: `H(value)`. An absent leaf is represented by `Digest::NIL`,
/// never by hashing an empty byte string.
pub fn leaf_hash(value: &[u8]) -> Digest {
    let mut hasher = Sha512_256::new();
    hasher.update(value);
    Digest(Some(hasher.finalize().into()))
}

/// Combines two child hashes into their parent's hash, per the asymmetric
/// internal hash rule that keeps the tree sparse:
///
/// - both children `nil` → `nil`
/// - only left present → `H(left)`
/// - only right present → `H(right)`
/// - both present → `H(left ++ right)`
pub fn node_hash(left: &Digest, right: &Digest) -> Digest {
    match (left.as_bytes(), right.as_bytes()) {
        (None, None) => Digest::NIL,
        (Some(l), None) => {
            let mut hasher = Sha512_256::new();
            hasher.update(l);
            Digest(Some(hasher.finalize().into()))
        }
        (None, Some(r)) => {
            let mut hasher = Sha512_256::new();
            hasher.update(r);
            Digest(Some(hasher.finalize().into()))
        }
        (Some(l), Some(r)) => {
            let mut hasher = Sha512_256::new();
            hasher.update(l);
            hasher.update(r);
            Digest(Some(hasher.finalize().into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_combines_to_nil() {
        assert!(node_hash(&Digest::NIL, &Digest::NIL).is_nil());
    }

    #[test]
    fn single_child_is_forwarded_rehashed() {
        let leaf = leaf_hash(&[0x01]);
        let with_left_only = node_hash(&leaf, &Digest::NIL);
        let with_right_only = node_hash(&Digest::NIL, &leaf);
        // Both sides use the same one-child rule, so they agree.
        assert_eq!(with_left_only, with_right_only);
        // And they must differ from the bare leaf hash itself (it gets rehashed).
        assert_ne!(with_left_only, leaf);
    }

    #[test]
    fn both_children_present_is_not_commutative() {
        let a = leaf_hash(&[0x01]);
        let b = leaf_hash(&[0x02]);
        assert_ne!(node_hash(&a, &b), node_hash(&b, &a));
    }

    #[test]
    fn leaf_hash_is_32_bytes() {
        let h = leaf_hash(b"some value");
        assert_eq!(h.as_bytes().unwrap().len(), 32);
    }

    #[test]
    fn nil_round_trips_distinctly_from_a_real_all_zero_hash() {
        let nil = Digest::NIL;
        let zero_hash = Digest(Some([0u8; 32]));

        let nil_json = serde_json::to_string(&nil).unwrap();
        let zero_hash_json = serde_json::to_string(&zero_hash).unwrap();
        assert_ne!(nil_json, zero_hash_json);

        let nil_back: Digest = serde_json::from_str(&nil_json).unwrap();
        let zero_hash_back: Digest = serde_json::from_str(&zero_hash_json).unwrap();
        assert!(nil_back.is_nil());
        assert_eq!(zero_hash_back, zero_hash);
    }
}
