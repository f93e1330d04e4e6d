//! # Compact Relay Service
//!
//! Orchestrates the relay round trip on top of the domain layer: encodes
//! outgoing announcements, drives one [`PartialBlock`] per announced block,
//! and hands finished blocks to the validator.
//!
//! ## Thread Safety
//!
//! The service is shareable across threads via `Arc`; in-flight engines live
//! behind a `parking_lot::RwLock`, giving each block's reconstruction the
//! serialized access the engine requires.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use shared_types::{Block, Hash};

use crate::domain::{
    matching_transactions, BlockTxnRequest, BlockTxnResponse, CompactBlock, FillStatus,
    PartialBlock, RelayError,
};
use crate::ports::outbound::{TxPoolView, ValidatorGateway};

/// A reconstruction waiting on its missing-transaction response.
struct InFlight {
    partial: PartialBlock,
    request: BlockTxnRequest,
}

/// Compact-block relay service.
///
/// Receiver path: `handle_compact_block` fills from the pool and either
/// submits the finished block or parks the engine and returns the follow-up
/// request. `handle_tx_response` completes a parked reconstruction. Sender
/// path: `encode_block` and `respond_tx_request`.
pub struct CompactRelayService<P, V>
where
    P: TxPoolView,
    V: ValidatorGateway,
{
    pool: Arc<P>,
    validator: Arc<V>,
    /// One engine per announced block, keyed by block hash.
    in_flight: RwLock<HashMap<Hash, InFlight>>,
}

impl<P, V> CompactRelayService<P, V>
where
    P: TxPoolView,
    V: ValidatorGateway,
{
    pub fn new(pool: Arc<P>, validator: Arc<V>) -> Self {
        Self {
            pool,
            validator,
            in_flight: RwLock::new(HashMap::new()),
        }
    }

    /// Encodes a block for announcement under a fresh random nonce.
    pub fn encode_block(&self, block: &Block) -> Result<CompactBlock, RelayError> {
        let msg = CompactBlock::from_block(block)?;
        debug!(
            block_hash = ?block.hash(),
            tx_count = block.transactions.len(),
            short_ids = msg.short_ids.len(),
            "Encoded compact block"
        );
        Ok(msg)
    }

    /// Handles an announced compact block.
    ///
    /// Returns `None` when the pool covered every slot (the block went to
    /// the validator), or the [`BlockTxnRequest`] to send back to the
    /// announcing peer. A second announcement of the same block replaces
    /// the previous engine, releasing its holds.
    pub fn handle_compact_block(
        &self,
        msg: &CompactBlock,
    ) -> Result<Option<BlockTxnRequest>, RelayError> {
        let block_hash = msg.block_hash();
        let mut partial = PartialBlock::new();

        match partial.init_data(msg, &*self.pool)? {
            FillStatus::Complete => {
                let block = partial.try_finalize(Vec::new())?;
                debug!(block_hash = ?block_hash, "Reconstructed block from pool alone");
                self.validator.submit_block(block)?;
                Ok(None)
            }
            FillStatus::Incomplete { missing } => {
                debug!(
                    block_hash = ?block_hash,
                    missing = missing.len(),
                    total = partial.tx_count(),
                    "Compact block incomplete, requesting missing transactions"
                );
                let request = BlockTxnRequest::new(block_hash, missing);
                let replaced = self
                    .in_flight
                    .write()
                    .insert(
                        block_hash,
                        InFlight {
                            partial,
                            request: request.clone(),
                        },
                    )
                    .is_some();
                if replaced {
                    warn!(block_hash = ?block_hash, "Replaced in-flight reconstruction");
                }
                Ok(Some(request))
            }
        }
    }

    /// Completes a parked reconstruction with the peer's response.
    ///
    /// The response is validated against the request recorded when the
    /// engine was parked; any mismatch discards the reconstruction (the
    /// peer can re-announce).
    pub fn handle_tx_response(&self, resp: BlockTxnResponse) -> Result<(), RelayError> {
        let InFlight {
            mut partial,
            request,
        } = self
            .in_flight
            .write()
            .remove(&resp.block_hash)
            .ok_or(RelayError::UnknownBlock(resp.block_hash))?;

        let missing = matching_transactions(&request, resp)?;
        let block = partial.try_finalize(missing)?;
        debug!(block_hash = ?block.hash(), "Completed reconstruction from response");
        self.validator.submit_block(block)
    }

    /// Answers a peer's missing-transaction request from a block we hold.
    pub fn respond_tx_request(
        &self,
        block: &Block,
        req: &BlockTxnRequest,
    ) -> Result<BlockTxnResponse, RelayError> {
        BlockTxnResponse::for_request(block, req)
    }

    /// Abandons an in-flight reconstruction, releasing its pool holds.
    ///
    /// Returns whether anything was in flight for the hash.
    pub fn discard(&self, block_hash: &Hash) -> bool {
        let removed = self.in_flight.write().remove(block_hash).is_some();
        if removed {
            debug!(block_hash = ?block_hash, "Discarded in-flight reconstruction");
        }
        removed
    }

    /// Number of reconstructions currently waiting on responses.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.read().len()
    }
}
