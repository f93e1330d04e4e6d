//! The partial-block reconstruction engine.
//!
//! One [`PartialBlock`] per announced block. It is initialized from a parsed
//! [`CompactBlock`], fills what it can from the transaction pool, reports the
//! still-missing positions, and finalizes into a full [`Block`] once the
//! missing transactions arrive.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──init_data──→ Ready ──try_finalize──→ Finalized
//!    │                     │                         │
//!    └───── drop ──────────┴──────── drop ───────────┘   (all holds released)
//! ```
//!
//! A failed `try_finalize` (wrong missing-transaction count) leaves the
//! engine `Ready`, so the caller may retry with a corrected list. Dropping
//! the engine at any point releases every pool hold; the pool's own entries
//! are untouched either way.
//!
//! ## Trust
//!
//! Short-id matching is advisory. Supplied missing transactions are NOT
//! checked against their slots here; a wrong one yields a structurally
//! complete block whose Merkle root the validator will reject after handoff.

use std::collections::HashSet;

use shared_types::{Block, BlockHeader, Hash, Transaction, TxRef};

use super::errors::RelayError;
use super::message::CompactBlock;
use super::requests::BlockTxnRequest;
use crate::ports::outbound::TxPoolView;

/// Outcome of filling slots from the pool.
///
/// Incomplete is not an error: it is the expected trigger for the
/// missing-transaction round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillStatus {
    /// Every slot resolved; `try_finalize(vec![])` will produce the block.
    Complete,
    /// Some positions unresolved, listed ascending.
    Incomplete { missing: Vec<u16> },
}

/// One slot per transaction position.
///
/// The variant records where a fill came from: prefilled transactions are
/// owned copies from the message, pool matches are shared holds that must be
/// released on teardown.
#[derive(Debug, Clone)]
enum Slot {
    Empty,
    Prefilled(Transaction),
    FromPool(TxRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Created,
    Ready,
    Finalized,
}

/// Stateful reconstruction engine for one in-flight compact block.
///
/// Not internally synchronized: callers serialize access per instance, one
/// instance per peer-announced block.
#[derive(Debug)]
pub struct PartialBlock {
    state: EngineState,
    header: BlockHeader,
    slots: Vec<Slot>,
}

impl Default for PartialBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialBlock {
    /// Creates an uninitialized engine.
    pub fn new() -> Self {
        Self {
            state: EngineState::Created,
            header: BlockHeader::default(),
            slots: Vec::new(),
        }
    }

    /// Initializes from a compact block and fills slots from the pool.
    ///
    /// Prefilled transactions go straight into their slots. Every remaining
    /// position is matched by short id against the pool under this message's
    /// key; a unique hit takes a shared hold on the pooled transaction, a
    /// collision between pooled transactions leaves the slot empty rather
    /// than guessing.
    ///
    /// # Errors
    ///
    /// Structural errors per [`CompactBlock::validate`], plus
    /// `DuplicateShortIds` when the message itself repeats a short id and
    /// `AlreadyInitialized` on a second call.
    pub fn init_data(
        &mut self,
        msg: &CompactBlock,
        pool: &dyn TxPoolView,
    ) -> Result<FillStatus, RelayError> {
        if self.state != EngineState::Created {
            return Err(RelayError::AlreadyInitialized);
        }
        msg.validate()?;

        // A repeated short id in one message can never resolve both its
        // positions; reject instead of half-filling.
        let mut seen = HashSet::with_capacity(msg.short_ids.len());
        if !msg.short_ids.iter().all(|id| seen.insert(id)) {
            return Err(RelayError::DuplicateShortIds);
        }

        let total = msg.total_tx_count() as usize;
        let mut slots = vec![Slot::Empty; total];
        for p in &msg.prefilled {
            slots[usize::from(p.index)] = Slot::Prefilled(p.tx.clone());
        }

        let index = pool.short_id_index(&msg.short_id_key());
        let mut cursor = 0;
        for slot in slots.iter_mut() {
            if let Slot::Empty = slot {
                // validate() guarantees exactly one short id per non-prefilled
                // slot, so the cursor stays in range.
                if let Some(id) = msg.short_ids.get(cursor) {
                    cursor += 1;
                    if let Some(tx) = index.lookup(id) {
                        *slot = Slot::FromPool(tx);
                    }
                }
            }
        }

        self.header = msg.header.clone();
        self.slots = slots;
        self.state = EngineState::Ready;

        let missing = self.missing_indexes();
        if missing.is_empty() {
            Ok(FillStatus::Complete)
        } else {
            Ok(FillStatus::Incomplete { missing })
        }
    }

    /// True once every slot holds a transaction.
    pub fn is_complete(&self) -> bool {
        self.state == EngineState::Ready
            && self.slots.iter().all(|s| !matches!(s, Slot::Empty))
    }

    /// Whether the slot at `index` is resolved.
    pub fn is_tx_available(&self, index: usize) -> bool {
        matches!(
            self.slots.get(index),
            Some(Slot::Prefilled(_)) | Some(Slot::FromPool(_))
        )
    }

    /// Unresolved positions, strictly ascending.
    pub fn missing_indexes(&self) -> Vec<u16> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| matches!(s, Slot::Empty).then_some(i as u16))
            .collect()
    }

    /// Total slot count (the block's transaction count).
    pub fn tx_count(&self) -> usize {
        self.slots.len()
    }

    /// Header claimed by the announcing message.
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Hash of the block under reconstruction.
    pub fn block_hash(&self) -> Hash {
        self.header.hash()
    }

    /// Builds the follow-up request for the unresolved positions.
    ///
    /// Returns `None` when nothing is missing (or before initialization).
    pub fn build_tx_request(&self) -> Option<BlockTxnRequest> {
        if self.state != EngineState::Ready {
            return None;
        }
        let missing = self.missing_indexes();
        if missing.is_empty() {
            None
        } else {
            Some(BlockTxnRequest::new(self.block_hash(), missing))
        }
    }

    /// Fills the remaining slots and assembles the candidate block body.
    ///
    /// `missing` must contain exactly one transaction per unresolved slot,
    /// in slot order. A count mismatch is a structural error and leaves the
    /// engine `Ready` for a retry. Success is terminal: every pool hold is
    /// released and the ordered body is handed back for validation.
    ///
    /// The supplied transactions are not checked against their slots; a
    /// wrong transaction surfaces downstream as a Merkle-root mismatch.
    pub fn try_finalize(&mut self, missing: Vec<Transaction>) -> Result<Block, RelayError> {
        match self.state {
            EngineState::Created => return Err(RelayError::NotInitialized),
            EngineState::Finalized => return Err(RelayError::AlreadyFinalized),
            EngineState::Ready => {}
        }

        let expected = self.slots.iter().filter(|s| matches!(s, Slot::Empty)).count();
        if missing.len() != expected {
            return Err(RelayError::MissingCountMismatch {
                expected,
                supplied: missing.len(),
            });
        }

        let mut supplied = missing.into_iter();
        let mut transactions = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            match slot {
                Slot::Empty => {
                    if let Some(tx) = supplied.next() {
                        transactions.push(tx);
                    }
                }
                Slot::Prefilled(tx) => transactions.push(tx.clone()),
                Slot::FromPool(tx) => transactions.push(Transaction::clone(tx)),
            }
        }

        // Terminal: drop every hold before handing the body off.
        self.slots = Vec::new();
        self.state = EngineState::Finalized;

        Ok(Block {
            header: self.header.clone(),
            transactions,
        })
    }
}
