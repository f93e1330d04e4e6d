//! # Compact-Block Relay Subsystem
//!
//! Wire-efficient block announcement and reconstruction. A newly found block
//! is announced as a header plus 48-bit short transaction ids; the receiver
//! rebuilds the full body mostly from its own transaction pool and fetches
//! only the transactions it is actually missing.
//!
//! ## Protocol Flow
//!
//! ```text
//! [Sender]  ──CompactBlock (header, nonce, prefilled, short ids)──→ [Receiver]
//!                                                                      │
//!                                        fill slots from pool ←────────┘
//!                                                │
//! [Sender]  ←──BlockTxnRequest (missing indexes)─┘  (only if incomplete)
//! [Sender]  ──BlockTxnResponse (missing transactions)──→ [Receiver]
//!                                                             │
//!                                    finalize → [Validator] ←─┘
//! ```
//!
//! ## Trust Boundary
//!
//! This subsystem reconstructs a *candidate* block body and reports whether
//! reconstruction succeeded structurally. Short-id matching is advisory: a
//! peer that answers a missing-transaction request with the wrong transaction
//! produces a structurally complete block whose Merkle root will not match
//! the header. Catching that is the validator's job after handoff, never ours.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::outbound::{TxPoolView, ValidatorGateway};
pub use service::CompactRelayService;
