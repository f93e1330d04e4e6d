//! Outbound ports (SPI) for the compact-relay subsystem.
//!
//! The relay consumes a transaction pool and produces to a validator; both
//! live behind traits implemented by adapters elsewhere in the node.

use shared_types::{Block, Hash, TxRef};

use crate::domain::errors::RelayError;
use crate::domain::short_id::{ShortIdIndex, ShortIdKey};

/// Read view onto the shared transaction pool.
///
/// Handles returned here are shared holds: the pool may evict its own entry
/// at any time without invalidating them.
pub trait TxPoolView: Send + Sync {
    /// Looks up a transaction by full hash.
    fn lookup(&self, hash: &Hash) -> Option<TxRef>;

    /// Snapshot of every pooled transaction.
    fn snapshot(&self) -> Vec<TxRef>;

    /// Short-id index over the current pool contents under a caller-supplied
    /// key. Colliding entries come back ambiguous and match nothing.
    fn short_id_index(&self, key: &ShortIdKey) -> ShortIdIndex {
        ShortIdIndex::build(self.snapshot(), key)
    }
}

/// Handoff target for structurally complete blocks.
///
/// The gateway recomputes the Merkle root and runs proof-of-work and
/// consensus checks; rejection of a maliciously filled block happens there,
/// never in the relay.
pub trait ValidatorGateway: Send + Sync {
    /// Submits a reconstructed block for full validation.
    fn submit_block(&self, block: Block) -> Result<(), RelayError>;
}
