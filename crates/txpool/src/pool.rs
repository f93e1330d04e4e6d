//! The pool itself: hash-indexed shared transaction handles.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use compact_relay::ports::outbound::TxPoolView;
use shared_types::{Hash, Transaction, TxRef};

use crate::errors::PoolError;

/// Concurrent transaction pool.
///
/// Interior-mutable: every method takes `&self`, so the pool can be shared
/// behind an `Arc` and mutated while reconstructions are in flight. Removal
/// drops only the pool's own hold; handles given out earlier stay valid.
#[derive(Debug, Default)]
pub struct TransactionPool {
    by_hash: RwLock<HashMap<Hash, TxRef>>,
}

impl TransactionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a shared handle the caller already holds.
    ///
    /// # Errors
    ///
    /// `DuplicateTransaction` if the hash is already pooled.
    pub fn insert(&self, tx: TxRef) -> Result<(), PoolError> {
        let hash = tx.hash();
        let mut by_hash = self.by_hash.write();
        if by_hash.contains_key(&hash) {
            return Err(PoolError::DuplicateTransaction(hash));
        }
        by_hash.insert(hash, tx);
        debug!(tx_hash = ?hash, pooled = by_hash.len(), "Pooled transaction");
        Ok(())
    }

    /// Takes ownership of a transaction and returns a handle to it.
    pub fn insert_tx(&self, tx: Transaction) -> Result<TxRef, PoolError> {
        let tx = Arc::new(tx);
        self.insert(Arc::clone(&tx))?;
        Ok(tx)
    }

    /// Removes an entry, returning the pool's hold to the caller.
    ///
    /// Other holders of the same transaction are unaffected.
    pub fn remove(&self, hash: &Hash) -> Option<TxRef> {
        let removed = self.by_hash.write().remove(hash);
        if removed.is_some() {
            debug!(tx_hash = ?hash, "Evicted transaction");
        }
        removed
    }

    /// Looks up a transaction, handing out an additional hold.
    pub fn get(&self, hash: &Hash) -> Option<TxRef> {
        self.by_hash.read().get(hash).map(Arc::clone)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.by_hash.read().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.by_hash.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.read().is_empty()
    }
}

impl TxPoolView for TransactionPool {
    fn lookup(&self, hash: &Hash) -> Option<TxRef> {
        self.get(hash)
    }

    fn snapshot(&self) -> Vec<TxRef> {
        self.by_hash.read().values().map(Arc::clone).collect()
    }
}
