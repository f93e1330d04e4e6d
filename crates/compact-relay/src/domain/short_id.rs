//! Short transaction ids: keyed 48-bit references to pooled transactions.
//!
//! Key material is derived per message from the block header hash and a
//! nonce chosen fresh by the sender, so an adversary cannot precompute
//! colliding decoys against a fixed key and seed victims' pools with them.
//!
//! Formula: `short_id = SipHash-2-4(k0, k1, tx_hash)[0:6]` where
//! `(k0, k1) = SHA-256(header_hash || nonce_le)[0:16]` read as two
//! little-endian u64 words.

use siphasher::sip::SipHasher24;
use std::collections::HashMap;
use std::hash::Hasher;

use shared_types::{sha256, Hash, TxRef};

/// Short transaction ID (6 bytes, little-endian low 48 bits of the PRF).
///
/// With random transactions the collision probability stays negligible for
/// realistic pool sizes, but collisions are NOT impossible; matching treats
/// any tie as ambiguous rather than guessing.
pub type ShortTxId = [u8; 6];

/// SipHash key material derived from one compact-block message.
///
/// Pure function of public fields; encoder and decoder recompute it
/// identically and it is never reused across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortIdKey {
    k0: u64,
    k1: u64,
}

impl ShortIdKey {
    /// Derives key material from the header hash and the message nonce.
    pub fn derive(header_hash: &Hash, nonce: u64) -> Self {
        let mut buf = [0u8; 40];
        buf[..32].copy_from_slice(header_hash);
        buf[32..].copy_from_slice(&nonce.to_le_bytes());
        let digest = sha256(&buf);

        let mut k0 = [0u8; 8];
        let mut k1 = [0u8; 8];
        k0.copy_from_slice(&digest[..8]);
        k1.copy_from_slice(&digest[8..16]);
        Self {
            k0: u64::from_le_bytes(k0),
            k1: u64::from_le_bytes(k1),
        }
    }
}

/// Computes the 48-bit short id of a transaction under the given key.
pub fn compute_short_id(key: &ShortIdKey, tx_hash: &Hash) -> ShortTxId {
    let mut hasher = SipHasher24::new_with_keys(key.k0, key.k1);
    hasher.write(tx_hash);
    let full = hasher.finish();

    let mut id = [0u8; 6];
    id.copy_from_slice(&full.to_le_bytes()[..6]);
    id
}

/// Reads a short id back out of its 48-bit integer form (wire helper).
pub fn short_id_from_u64(v: u64) -> ShortTxId {
    let mut id = [0u8; 6];
    id.copy_from_slice(&v.to_le_bytes()[..6]);
    id
}

/// The 48-bit integer form of a short id (wire helper).
pub fn short_id_to_u64(id: &ShortTxId) -> u64 {
    let mut le = [0u8; 8];
    le[..6].copy_from_slice(id);
    u64::from_le_bytes(le)
}

enum IndexEntry {
    Unique(TxRef),
    Ambiguous,
}

/// Pool-side short-id index under one message's key material.
///
/// Two pooled transactions hashing to the same short id mark that id
/// ambiguous: a lookup then matches nothing, leaving the slot for the
/// missing-transaction round trip instead of risking the wrong fill.
pub struct ShortIdIndex {
    entries: HashMap<ShortTxId, IndexEntry>,
}

impl ShortIdIndex {
    /// Builds the index over a snapshot of pooled transactions.
    pub fn build<I>(txs: I, key: &ShortIdKey) -> Self
    where
        I: IntoIterator<Item = TxRef>,
    {
        let mut entries = HashMap::new();
        for tx in txs {
            let id = compute_short_id(key, &tx.hash());
            entries
                .entry(id)
                .and_modify(|e| *e = IndexEntry::Ambiguous)
                .or_insert(IndexEntry::Unique(tx));
        }
        Self { entries }
    }

    /// Looks up a short id, returning a hold on the unique match.
    ///
    /// Ambiguous ids return `None`.
    pub fn lookup(&self, id: &ShortTxId) -> Option<TxRef> {
        match self.entries.get(id) {
            Some(IndexEntry::Unique(tx)) => Some(TxRef::clone(tx)),
            _ => None,
        }
    }

    /// True if two pooled transactions collided on this id.
    pub fn is_ambiguous(&self, id: &ShortTxId) -> bool {
        matches!(self.entries.get(id), Some(IndexEntry::Ambiguous))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
