use thiserror::Error;

/// Errors returned by the proof algebra (`verify`, `filter`, `update`).
///
/// Programmer-contract violations reaching the tree engine itself (duplicate
/// index in a batch, unsorted batch, out-of-range index) are not represented
/// here: they are bugs in the embedder and the engine panics instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsmtError {
    #[error("path cannot be empty")]
    PathEmpty,

    #[error("path length is invalid. Actual: {actual}, expected: {expected}")]
    PathLengthInvalid { actual: usize, expected: usize },

    #[error("root hash at path[0] does not match the supplied root")]
    RootMismatch,

    #[error("leaf index at path[height] does not match the supplied index. Actual: {actual}, expected: {expected}")]
    IndexMismatch { actual: u64, expected: u64 },

    #[error("leaf hash at path[height] does not match the hash of the supplied value")]
    LeafHashMismatch,

    #[error("recomputed root does not match the supplied root")]
    AuditFailed,

    #[error("subbranches have diverged while rebasing the proof")]
    SubbranchDiverged,

    #[error("self-update is forbidden: the newer batch touches the proof's own leaf, re-filter instead")]
    SelfUpdateForbidden,

    #[error("unexpected root intersection: the two trails' roots cannot be coherently combined")]
    UnexpectedRootIntersection,
}
