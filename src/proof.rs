//! Proof algebra: `verify` a path against a root, `filter` a root-to-leaf
//! path out of a full audit trail, and `update` (rebase) a path across a
//! later batch mutation without re-walking the whole tree.

use crate::error::CsmtError;
use crate::hash::{leaf_hash, node_hash, Digest};
use crate::tree::{AuditNode, AuditTrail};

/// A root-to-leaf inclusion path: `path[0]` is the root (level = tree
/// height), `path[height]` is the leaf (level 0). Unlike an `AuditTrail`,
/// every slot is populated — siblings that weren't touched by whatever
/// produced the path are still present, read from the cache at filter time.
pub type Path = Vec<AuditNode>;

/// Recomputes the root from `path` and checks it against `root`, that the
/// leaf slot's index matches `index`, and that its hash matches `value`.
pub fn verify(path: &Path, height: u8, index: u64, value: &[u8], root: &Digest) -> Result<(), CsmtError> {
    if path.is_empty() {
        return Err(CsmtError::PathEmpty);
    }
    let expected_len = height as usize + 1;
    if path.len() != expected_len {
        return Err(CsmtError::PathLengthInvalid {
            actual: path.len(),
            expected: expected_len,
        });
    }
    if path[0].value != *root {
        return Err(CsmtError::RootMismatch);
    }
    let leaf = &path[height as usize];
    if leaf.index != index {
        return Err(CsmtError::IndexMismatch {
            actual: leaf.index,
            expected: index,
        });
    }
    let expected_leaf_hash = leaf_hash(value);
    if leaf.value != expected_leaf_hash {
        return Err(CsmtError::LeafHashMismatch);
    }

    let mut hash = expected_leaf_hash;
    let mut idx = index;
    for slot in (0..height as usize).rev() {
        let node = &path[slot];
        hash = if idx % 2 == 0 {
            node_hash(&hash, &node.right_sibling)
        } else {
            node_hash(&node.left_sibling, &hash)
        };
        idx >>= 1;
    }

    if hash != *root {
        return Err(CsmtError::AuditFailed);
    }
    Ok(())
}

/// Extracts the root-to-leaf path for `index` out of a full audit trail, by
/// scanning it in reverse (most recently emitted first) and taking, for
/// each level from the leaf upward, the first node whose index matches the
/// leaf's ancestor chain at that level.
///
/// The trail is pre-order (self, then left recursion, then right
/// recursion), so a node's own audit entry for its ancestors was emitted
/// *after* the node itself in the insert/delete walk, hence the reverse
/// scan finds the leaf first and its ancestors in order walking backwards.
pub fn filter(trail: &AuditTrail, height: u8, index: u64) -> Path {
    let mut result: Path = vec![AuditNode::default(); height as usize + 1];
    let mut idx = index;
    let mut expected_level: u8 = 0;
    for node in trail.iter().rev() {
        if expected_level as usize > height as usize {
            break;
        }
        if node.index != idx || node.level != expected_level {
            continue;
        }
        let slot = (height - expected_level) as usize;
        result[slot] = *node;
        expected_level += 1;
        idx >>= 1;
    }
    result
}

/// Rebases `old_path` (a proof for leaf `self_index`) across `newer_trail`,
/// the audit trail of a later batch mutation, without needing the full
/// trail re-filtered from a from-scratch walk.
///
/// Walks `old_path` from the slot just above the leaf up to the root,
/// looking for the deepest point where `newer_trail` also touched that
/// exact `(level, index)` position (scanning latest-emitted first, so the
/// *closest* match to that position is used if a level/index pair happens
/// to repeat). Once such an intersection is found, it and everything
/// between it and the root are replaced wholesale by the newer trail's
/// nodes; each replacement is checked against its neighbour for
/// consistency, and anything below the deepest intersection (closer to the
/// leaf) is left untouched, since the newer batch never reached it.
///
/// Returns `Err(SelfUpdateForbidden)` if the newer batch touched the proof's
/// own leaf — in that case the proof is stale in a way rebasing cannot fix;
/// the caller must filter a fresh path instead.
pub fn update(old_path: &Path, self_index: u64, newer_trail: &AuditTrail) -> Result<Path, CsmtError> {
    if old_path.is_empty() {
        return Err(CsmtError::PathEmpty);
    }
    let height = old_path.len() - 1;

    if newer_trail
        .iter()
        .any(|node| node.level == 0 && node.index == self_index)
    {
        return Err(CsmtError::SelfUpdateForbidden);
    }

    let mut joined = old_path.clone();
    let mut intersection_found = false;
    let mut search_limit = newer_trail.len();

    // Slot 0 (the root) always matches *some* node in `newer_trail` by
    // construction — every batch's trail starts with the recomputed root —
    // so it gets its own pass after this loop rather than being handled by
    // the generic branches below, which would silently treat a genuinely
    // incoherent pair of roots as an ordinary subbranch divergence.
    for slot in (1..height).rev() {
        let current = joined[slot];
        let previous = joined[slot + 1];
        let predecessor_is_left = previous.index % 2 == 0;

        let found = newer_trail[..search_limit]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| node.level == current.level && node.index == current.index);

        if !intersection_found {
            match found {
                Some((i, extra)) => {
                    let diverged = if predecessor_is_left {
                        extra.left_sibling != current.left_sibling
                    } else {
                        extra.right_sibling != current.right_sibling
                    };
                    if diverged {
                        return Err(CsmtError::SubbranchDiverged);
                    }
                    joined[slot] = *extra;
                    intersection_found = true;
                    search_limit = i;
                }
                None => {
                    search_limit = newer_trail.len();
                }
            }
        } else if let Some((i, extra)) = found {
            let diverged = if predecessor_is_left {
                extra.left_sibling != previous.value
            } else {
                extra.right_sibling != previous.value
            };
            if diverged {
                return Err(CsmtError::SubbranchDiverged);
            }
            joined[slot] = *extra;
            search_limit = i;
        }
    }

    let other_root = newer_trail
        .first()
        .copied()
        .ok_or(CsmtError::UnexpectedRootIntersection)?;

    if intersection_found {
        // A genuine, deeper intersection already confirmed the two trails
        // share a subbranch; the root is just the top of that same chain,
        // so it is checked the same way as every other slot above.
        let previous = joined[1];
        let predecessor_is_left = previous.index % 2 == 0;
        let diverged = if predecessor_is_left {
            other_root.left_sibling != previous.value
        } else {
            other_root.right_sibling != previous.value
        };
        if diverged {
            return Err(CsmtError::SubbranchDiverged);
        }
        joined[0] = other_root;
    } else {
        // The newer batch never touched anything on `old_path` below the
        // root: the two roots' untouched sides must complement each other
        // (one has a left sibling the other lacks, or vice versa) for them
        // to combine into a coherent new root at all.
        let this_root = joined[0];
        let new_root_hash = if !this_root.left_sibling.is_nil() && !other_root.right_sibling.is_nil() {
            node_hash(&this_root.left_sibling, &other_root.right_sibling)
        } else if !this_root.right_sibling.is_nil() && !other_root.left_sibling.is_nil() {
            node_hash(&other_root.left_sibling, &this_root.right_sibling)
        } else {
            return Err(CsmtError::UnexpectedRootIntersection);
        };
        joined[0] = AuditNode {
            level: this_root.level,
            index: this_root.index,
            value: new_root_hash,
            left_sibling: if this_root.left_sibling.is_nil() {
                other_root.left_sibling
            } else {
                this_root.left_sibling
            },
            right_sibling: if this_root.right_sibling.is_nil() {
                other_root.right_sibling
            } else {
                this_root.right_sibling
            },
        };
    }

    Ok(joined)
}

/// The leaf-upward rebase this crate's proof algebra shipped with before
/// [`update`]'s root-downward walk replaced it as the default. Kept only
/// for callers migrating off it; prefer `update`.
#[deprecated(note = "use `update`; this leaf-upward variant is retained for migration only")]
pub fn update_basic(old_path: &Path, self_index: u64, newer_trail: &AuditTrail) -> Result<Path, CsmtError> {
    if old_path.is_empty() {
        return Err(CsmtError::PathEmpty);
    }
    let height = old_path.len() - 1;
    let mut joined = old_path.clone();

    if newer_trail
        .iter()
        .any(|node| node.level == 0 && node.index == self_index)
    {
        return Err(CsmtError::SelfUpdateForbidden);
    }

    let mut found_any = false;
    for slot in (0..=height).rev() {
        let current = joined[slot];
        if let Some(extra) = newer_trail
            .iter()
            .rev()
            .find(|node| node.level == current.level && node.index == current.index)
        {
            joined[slot] = *extra;
            found_any = true;
        }
    }

    if !found_any {
        return Err(CsmtError::UnexpectedRootIntersection);
    }
    Ok(joined)
}
