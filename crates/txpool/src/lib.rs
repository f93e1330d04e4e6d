//! # Transaction Pool
//!
//! In-memory pool of transactions waiting to be mined, shared across
//! subsystems. Entries are [`TxRef`](shared_types::TxRef) handles: the pool
//! holds one reference per entry and hands out additional holds on lookup,
//! so eviction here never invalidates data another subsystem is still using.
//!
//! Indexing, fee accounting, and eviction policy are out of scope; this
//! crate carries exactly the surface the compact-block relay consumes.

pub mod errors;
pub mod pool;

pub use errors::PoolError;
pub use pool::TransactionPool;
