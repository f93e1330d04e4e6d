//! Ports (interfaces) for the compact-relay subsystem.

pub mod outbound;

pub use outbound::{TxPoolView, ValidatorGateway};
