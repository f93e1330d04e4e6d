//! Transaction pool error types.

use shared_types::Hash;
use thiserror::Error;

/// Transaction pool errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Transaction already in pool: {0:?}")]
    DuplicateTransaction(Hash),
}
