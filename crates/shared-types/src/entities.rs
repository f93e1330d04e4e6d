//! # Core Chain Entities
//!
//! Transactions, block headers, and blocks for a proof-of-work chain.
//!
//! ## Ownership
//!
//! Transaction data is immutable once built. Subsystems share it through
//! [`TxRef`] (`Arc<Transaction>`): the pool owns one hold per entry, and any
//! engine that matches a transaction into an in-flight block takes its own
//! hold. Dropping either side never invalidates the other.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::hashing::{merkle_root, sha256d};
use crate::wire::{ByteReader, ByteWriter, WireDecode, WireEncode, WireError};

/// A 32-byte hash (double SHA-256).
pub type Hash = [u8; 32];

/// Shared, immutable handle to a transaction.
///
/// Reference counts are observable via `Arc::strong_count`, which tests use
/// to verify that holds are taken and released where the contract says.
pub type TxRef = Arc<Transaction>;

/// Upper bound on script bytes accepted off the wire.
pub const MAX_SCRIPT_LEN: u64 = 10_000;

/// Upper bound on inputs or outputs accepted off the wire.
pub const MAX_TX_IO: u64 = 100_000;

/// A transaction input spending a previous output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Hash of the transaction being spent.
    pub prev_hash: Hash,
    /// Output index within that transaction.
    pub prev_index: u32,
    /// Unlocking script bytes.
    pub script_sig: Vec<u8>,
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units.
    pub value: u64,
    /// Locking script bytes.
    pub script_pubkey: Vec<u8>,
}

/// A raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Protocol version.
    pub version: u32,
    /// Inputs (a generation transaction spends the null outpoint).
    pub inputs: Vec<TxInput>,
    /// Outputs.
    pub outputs: Vec<TxOutput>,
    /// Earliest time/height the transaction may be mined.
    pub lock_time: u32,
}

impl Transaction {
    /// Transaction identity: double SHA-256 of the wire serialization.
    pub fn hash(&self) -> Hash {
        sha256d(&self.to_wire_bytes())
    }
}

impl WireEncode for TxInput {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_bytes(&self.prev_hash);
        w.put_u32(self.prev_index);
        w.put_var_bytes(&self.script_sig);
    }
}

impl WireDecode for TxInput {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            prev_hash: r.get_array()?,
            prev_index: r.get_u32()?,
            script_sig: r.get_var_bytes(MAX_SCRIPT_LEN)?,
        })
    }
}

impl WireEncode for TxOutput {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_u64(self.value);
        w.put_var_bytes(&self.script_pubkey);
    }
}

impl WireDecode for TxOutput {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            value: r.get_u64()?,
            script_pubkey: r.get_var_bytes(MAX_SCRIPT_LEN)?,
        })
    }
}

impl WireEncode for Transaction {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_u32(self.version);
        w.put_compact_size(self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(w);
        }
        w.put_compact_size(self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(w);
        }
        w.put_u32(self.lock_time);
    }
}

impl WireDecode for Transaction {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, WireError> {
        let version = r.get_u32()?;
        let input_count = r.get_count(MAX_TX_IO)?;
        let mut inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            inputs.push(TxInput::decode(r)?);
        }
        let output_count = r.get_count(MAX_TX_IO)?;
        let mut outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            outputs.push(TxOutput::decode(r)?);
        }
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time: r.get_u32()?,
        })
    }
}

/// Block header.
///
/// The merkle root is a claim made by the block producer; nothing in this
/// crate recomputes or checks it against the body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Protocol version.
    pub version: u32,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Claimed Merkle root over the block's transactions.
    pub merkle_root: Hash,
    /// Unix timestamp when the block was produced.
    pub timestamp: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

impl BlockHeader {
    /// Block identity: double SHA-256 of the wire serialization.
    pub fn hash(&self) -> Hash {
        sha256d(&self.to_wire_bytes())
    }
}

impl WireEncode for BlockHeader {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_u32(self.version);
        w.put_bytes(&self.parent_hash);
        w.put_bytes(&self.merkle_root);
        w.put_u32(self.timestamp);
        w.put_u32(self.bits);
        w.put_u32(self.nonce);
    }
}

impl WireDecode for BlockHeader {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            version: r.get_u32()?,
            parent_hash: r.get_array()?,
            merkle_root: r.get_array()?,
            timestamp: r.get_u32()?,
            bits: r.get_u32()?,
            nonce: r.get_u32()?,
        })
    }
}

/// A full block: header plus ordered transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// Transactions in block order; position 0 is the generation transaction.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Block identity (the header hash).
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Merkle root computed from the actual body.
    ///
    /// Validators compare this against `header.merkle_root` after
    /// reconstruction; the relay layer itself never does.
    pub fn computed_merkle_root(&self) -> Hash {
        let hashes: Vec<Hash> = self.transactions.iter().map(Transaction::hash).collect();
        merkle_root(&hashes)
    }
}
