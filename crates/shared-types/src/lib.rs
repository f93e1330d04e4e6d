//! # Shared Types Crate
//!
//! Chain primitives shared by every subsystem in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: transactions, blocks, and headers are
//!   defined here and nowhere else.
//! - **Immutable transaction data**: a [`TxRef`] is a shared, reference-counted
//!   handle; holding one keeps the bytes alive regardless of what the pool
//!   does with its own bookkeeping.
//! - **Byte-exact wire codec**: everything that crosses the wire goes through
//!   [`wire`], which round-trips losslessly.

pub mod entities;
pub mod hashing;
pub mod wire;

pub use entities::*;
pub use hashing::{merkle_root, sha256, sha256d};
pub use wire::{ByteReader, ByteWriter, WireDecode, WireEncode, WireError};
