//! Hashing primitives: SHA-256, double SHA-256, and Merkle roots.

use sha2::{Digest, Sha256};

use crate::entities::Hash;

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Double SHA-256, used for transaction and header identity.
pub fn sha256d(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

/// Merkle root over transaction hashes.
///
/// Pairs are hashed bottom-up; an odd node at any level is paired with
/// itself. The root of an empty list is the zero hash; the root of a single
/// hash is that hash itself (a one-transaction block commits directly to its
/// generation transaction).
pub fn merkle_root(tx_hashes: &[Hash]) -> Hash {
    if tx_hashes.is_empty() {
        return [0u8; 32];
    }
    if tx_hashes.len() == 1 {
        return tx_hashes[0];
    }

    let mut level: Vec<Hash> = tx_hashes.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            let mut buf = [0u8; 64];
            buf[..32].copy_from_slice(&left);
            buf[32..].copy_from_slice(&right);
            next.push(sha256d(&buf));
        }
        level = next;
    }
    level[0]
}
