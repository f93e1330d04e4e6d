//! The missing-transaction round trip: request by slot index, respond with
//! full transactions.

use shared_types::{
    Block, ByteReader, ByteWriter, Hash, Transaction, WireDecode, WireEncode,
};

use super::errors::RelayError;
use super::message::MAX_BLOCK_TX_COUNT;

/// Request for the transactions a receiver could not fill from its pool.
///
/// Indexes are 0-based slot positions, strictly ascending, no duplicates.
/// On the wire they are delta-encoded with the same previous-plus-one
/// convention as prefilled indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTxnRequest {
    /// Hash of the block being reconstructed.
    pub block_hash: Hash,
    /// Missing slot positions, ascending.
    pub indexes: Vec<u16>,
}

impl BlockTxnRequest {
    /// Builds a request; the caller supplies indexes already sorted ascending.
    pub fn new(block_hash: Hash, indexes: Vec<u16>) -> Self {
        Self {
            block_hash,
            indexes,
        }
    }

    /// Rejects out-of-order or duplicate indexes.
    pub fn validate(&self) -> Result<(), RelayError> {
        let ascending = self.indexes.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            return Err(RelayError::NonAscendingRequestIndexes);
        }
        Ok(())
    }

    /// Serializes to the wire form.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_wire_bytes()
    }

    /// Parses the wire form.
    pub fn parse(bytes: &[u8]) -> Result<Self, RelayError> {
        let mut r = ByteReader::new(bytes);
        let block_hash: Hash = r.get_array()?;

        let count = r.get_count(MAX_BLOCK_TX_COUNT)?;
        let mut indexes = Vec::with_capacity(count as usize);
        let mut next_index: u64 = 0;
        for _ in 0..count {
            let delta = r.get_compact_size()?;
            let index = next_index
                .checked_add(delta)
                .filter(|&i| i < MAX_BLOCK_TX_COUNT)
                .ok_or(RelayError::IndexOverflow)?;
            indexes.push(index as u16);
            next_index = index + 1;
        }
        r.expect_eof()?;

        let req = Self {
            block_hash,
            indexes,
        };
        req.validate()?;
        Ok(req)
    }
}

impl WireEncode for BlockTxnRequest {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_bytes(&self.block_hash);
        w.put_compact_size(self.indexes.len() as u64);
        let mut next_index: u64 = 0;
        for &index in &self.indexes {
            w.put_compact_size(u64::from(index).saturating_sub(next_index));
            next_index = u64::from(index) + 1;
        }
    }
}

/// Response carrying the requested transactions, 1:1 by request position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTxnResponse {
    /// Hash of the block the transactions belong to.
    pub block_hash: Hash,
    /// Transactions in the order the request listed their indexes.
    pub transactions: Vec<Transaction>,
}

impl BlockTxnResponse {
    /// Answers a request from the full block (sender side).
    ///
    /// # Errors
    ///
    /// `RequestIndexOutOfRange` when the peer asks for a slot the block does
    /// not have.
    pub fn for_request(block: &Block, req: &BlockTxnRequest) -> Result<Self, RelayError> {
        req.validate()?;
        let mut transactions = Vec::with_capacity(req.indexes.len());
        for &index in &req.indexes {
            let tx = block.transactions.get(usize::from(index)).ok_or(
                RelayError::RequestIndexOutOfRange {
                    index,
                    total: block.transactions.len(),
                },
            )?;
            transactions.push(tx.clone());
        }
        Ok(Self {
            block_hash: block.hash(),
            transactions,
        })
    }

    /// Serializes to the wire form.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_wire_bytes()
    }

    /// Parses the wire form.
    pub fn parse(bytes: &[u8]) -> Result<Self, RelayError> {
        let mut r = ByteReader::new(bytes);
        let block_hash: Hash = r.get_array()?;
        let count = r.get_count(MAX_BLOCK_TX_COUNT)?;
        let mut transactions = Vec::with_capacity(count as usize);
        for _ in 0..count {
            transactions.push(Transaction::decode(&mut r)?);
        }
        r.expect_eof()?;
        Ok(Self {
            block_hash,
            transactions,
        })
    }
}

impl WireEncode for BlockTxnResponse {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_bytes(&self.block_hash);
        w.put_compact_size(self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.encode(w);
        }
    }
}

/// Pairs a response against its request, yielding `try_finalize` input.
///
/// A length mismatch or a response for a different block is a structural
/// error, not a retry condition.
pub fn matching_transactions(
    req: &BlockTxnRequest,
    resp: BlockTxnResponse,
) -> Result<Vec<Transaction>, RelayError> {
    if resp.block_hash != req.block_hash {
        return Err(RelayError::BlockHashMismatch {
            expected: req.block_hash,
            got: resp.block_hash,
        });
    }
    if resp.transactions.len() != req.indexes.len() {
        return Err(RelayError::ResponseLengthMismatch {
            requested: req.indexes.len(),
            received: resp.transactions.len(),
        });
    }
    Ok(resp.transactions)
}
