//! # Compact-Relay Test Suite
//!
//! Unified test crate for flows that span the relay core, the transaction
//! pool, and the wire format.
//!
//! ```bash
//! cargo test -p relay-tests
//! ```

pub mod integration;
