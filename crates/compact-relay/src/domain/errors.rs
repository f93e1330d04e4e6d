//! Structural error types for compact-block relay.
//!
//! Everything here is a malformed-message or misuse condition: rejected
//! immediately, never retried inside this subsystem. "Some slots still
//! missing" is deliberately NOT an error — see
//! [`FillStatus`](super::reconstruction::FillStatus).

use shared_types::{Hash, WireError};
use thiserror::Error;

/// Compact-block relay errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Compact block carries no transactions")]
    NoTransactions,

    #[error("Block claims {count} transactions (max {max})")]
    OversizedBlock { count: u64, max: u64 },

    #[error("Prefilled index {index} out of range for {total} transactions")]
    PrefilledIndexOutOfRange { index: u32, total: u64 },

    #[error("Prefilled indexes must be strictly increasing")]
    NonIncreasingPrefilledIndexes,

    #[error("Index delta overflows the 16-bit index space")]
    IndexOverflow,

    #[error("Duplicate short ids within one message")]
    DuplicateShortIds,

    #[error("Reconstruction engine already initialized")]
    AlreadyInitialized,

    #[error("Reconstruction engine not initialized")]
    NotInitialized,

    #[error("Reconstruction engine already finalized")]
    AlreadyFinalized,

    #[error("Supplied {supplied} transactions for {expected} missing slots")]
    MissingCountMismatch { expected: usize, supplied: usize },

    #[error("Response carries {received} transactions for {requested} requested indexes")]
    ResponseLengthMismatch { requested: usize, received: usize },

    #[error("Response block hash does not match the request")]
    BlockHashMismatch { expected: Hash, got: Hash },

    #[error("No in-flight reconstruction for block {0:?}")]
    UnknownBlock(Hash),

    #[error("Requested index {index} out of range for block with {total} transactions")]
    RequestIndexOutOfRange { index: u16, total: usize },

    #[error("Request indexes must be strictly ascending")]
    NonAscendingRequestIndexes,

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
}
