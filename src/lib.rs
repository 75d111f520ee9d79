//! `compact-smt` is a crate containing a compact sparse Merkle tree (CSMT) engine: a
//! recursive batch insert/delete walker, a branch cache, and the proof algebra
//! (verify / filter / update) used to maintain inclusion proofs across tree mutations.

pub mod cache;
pub mod error;
pub mod hash;
pub mod params;
pub mod proof;
pub mod tree;

pub use cache::BranchCache;
pub use error::CsmtError;
pub use hash::Digest;
pub use params::TreeConfig;
pub use proof::{filter, update, update_basic, verify, Path};
pub use tree::{AuditNode, AuditTrail, DeletionBatch, InsertionBatch, InsertionItem, Tree};

// Public re-export, so embedders don't have to specify it as their own dependency
// when they want to inspect cache sizes with the same hasher fnv uses internally.
pub use fnv;
