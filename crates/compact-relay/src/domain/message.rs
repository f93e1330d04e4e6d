//! The compact-block wire message: header, nonce, prefilled transactions,
//! and short ids for everything else, in block order.

use shared_types::{
    Block, BlockHeader, ByteReader, ByteWriter, Hash, Transaction, WireDecode, WireEncode,
};

use super::errors::RelayError;
use super::short_id::{compute_short_id, short_id_from_u64, short_id_to_u64, ShortIdKey, ShortTxId};

/// Hard cap on transactions a compact block may claim.
///
/// Slot indexes travel as 16-bit values, so the index space is the bound.
pub const MAX_BLOCK_TX_COUNT: u64 = 1 << 16;

/// A transaction shipped in full inside the compact block.
///
/// Senders prefill transactions the receiver cannot have pooled - the
/// generation transaction above all. On the wire the index is delta-encoded
/// against the previous prefilled index plus one, which forces strictly
/// increasing positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefilledTransaction {
    /// Absolute position in the block's transaction list.
    pub index: u16,
    /// The full transaction.
    pub tx: Transaction,
}

/// Compact block announcement.
///
/// `prefilled.len() + short_ids.len()` equals the block's total transaction
/// count; every position is covered exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactBlock {
    /// Block header, including the claimed Merkle root.
    pub header: BlockHeader,
    /// Per-message nonce feeding short-id key derivation. Never reused.
    pub nonce: u64,
    /// Transactions included in full, ascending by index.
    pub prefilled: Vec<PrefilledTransaction>,
    /// Short ids for every position not covered by a prefilled entry,
    /// in block order.
    pub short_ids: Vec<ShortTxId>,
}

impl CompactBlock {
    /// Encodes a block with a freshly generated random nonce.
    ///
    /// Position 0 (the generation transaction) is always prefilled; every
    /// other transaction is represented by its short id alone.
    pub fn from_block(block: &Block) -> Result<Self, RelayError> {
        Self::from_block_with_nonce(block, rand::random())
    }

    /// Encodes a block under a caller-chosen nonce.
    ///
    /// Deterministic variant of [`CompactBlock::from_block`] for senders that
    /// manage their own nonces and for tests.
    pub fn from_block_with_nonce(block: &Block, nonce: u64) -> Result<Self, RelayError> {
        if block.transactions.is_empty() {
            return Err(RelayError::NoTransactions);
        }
        if block.transactions.len() as u64 > MAX_BLOCK_TX_COUNT {
            return Err(RelayError::OversizedBlock {
                count: block.transactions.len() as u64,
                max: MAX_BLOCK_TX_COUNT,
            });
        }

        let key = ShortIdKey::derive(&block.header.hash(), nonce);
        let short_ids = block.transactions[1..]
            .iter()
            .map(|tx| compute_short_id(&key, &tx.hash()))
            .collect();

        Ok(Self {
            header: block.header.clone(),
            nonce,
            prefilled: vec![PrefilledTransaction {
                index: 0,
                tx: block.transactions[0].clone(),
            }],
            short_ids,
        })
    }

    /// Total transaction count the message claims for the block.
    pub fn total_tx_count(&self) -> u64 {
        self.prefilled.len() as u64 + self.short_ids.len() as u64
    }

    /// Hash of the announced block.
    pub fn block_hash(&self) -> Hash {
        self.header.hash()
    }

    /// Key material for this message, derived from its own public fields.
    pub fn short_id_key(&self) -> ShortIdKey {
        ShortIdKey::derive(&self.header.hash(), self.nonce)
    }

    /// Recomputes a transaction's short id under this message's key.
    pub fn get_short_id(&self, tx_hash: &Hash) -> ShortTxId {
        compute_short_id(&self.short_id_key(), tx_hash)
    }

    /// Checks the structural invariants shared by parsing and reconstruction.
    ///
    /// Rejects an empty transaction list, an oversized claim, and prefilled
    /// indexes that are out of range or not strictly increasing.
    pub fn validate(&self) -> Result<(), RelayError> {
        let total = self.total_tx_count();
        if total == 0 {
            return Err(RelayError::NoTransactions);
        }
        if total > MAX_BLOCK_TX_COUNT {
            return Err(RelayError::OversizedBlock {
                count: total,
                max: MAX_BLOCK_TX_COUNT,
            });
        }

        let mut prev: Option<u16> = None;
        for p in &self.prefilled {
            if let Some(prev) = prev {
                if p.index <= prev {
                    return Err(RelayError::NonIncreasingPrefilledIndexes);
                }
            }
            if u64::from(p.index) >= total {
                return Err(RelayError::PrefilledIndexOutOfRange {
                    index: u32::from(p.index),
                    total,
                });
            }
            prev = Some(p.index);
        }
        Ok(())
    }

    /// Serializes to the wire form.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_wire_bytes()
    }

    /// Parses the wire form, enforcing the structural invariants.
    pub fn parse(bytes: &[u8]) -> Result<Self, RelayError> {
        let mut r = ByteReader::new(bytes);

        let header = BlockHeader::decode(&mut r)?;
        let nonce = r.get_u64()?;

        let prefilled_count = r.get_count(MAX_BLOCK_TX_COUNT)?;
        let mut prefilled = Vec::with_capacity(prefilled_count as usize);
        let mut next_index: u64 = 0;
        for _ in 0..prefilled_count {
            let delta = r.get_compact_size()?;
            let index = next_index
                .checked_add(delta)
                .filter(|&i| i < MAX_BLOCK_TX_COUNT)
                .ok_or(RelayError::IndexOverflow)?;
            prefilled.push(PrefilledTransaction {
                index: index as u16,
                tx: Transaction::decode(&mut r)?,
            });
            next_index = index + 1;
        }

        let short_id_count = r.get_count(MAX_BLOCK_TX_COUNT)?;
        let mut short_ids = Vec::with_capacity(short_id_count as usize);
        for _ in 0..short_id_count {
            let lsb = u64::from(r.get_u32()?);
            let msb = u64::from(r.get_u16()?);
            short_ids.push(short_id_from_u64((msb << 32) | lsb));
        }

        r.expect_eof()?;

        let msg = Self {
            header,
            nonce,
            prefilled,
            short_ids,
        };
        msg.validate()?;
        Ok(msg)
    }
}

impl WireEncode for CompactBlock {
    fn encode(&self, w: &mut ByteWriter) {
        self.header.encode(w);
        w.put_u64(self.nonce);

        w.put_compact_size(self.prefilled.len() as u64);
        let mut next_index: u64 = 0;
        for p in &self.prefilled {
            w.put_compact_size(u64::from(p.index).saturating_sub(next_index));
            p.tx.encode(w);
            next_index = u64::from(p.index) + 1;
        }

        w.put_compact_size(self.short_ids.len() as u64);
        for id in &self.short_ids {
            let v = short_id_to_u64(id);
            w.put_u32((v & 0xFFFF_FFFF) as u32);
            w.put_u16((v >> 32) as u16);
        }
    }
}
