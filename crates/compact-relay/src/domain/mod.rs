//! Domain layer for compact-block relay.

pub mod errors;
pub mod message;
pub mod reconstruction;
pub mod requests;
pub mod short_id;

pub use errors::RelayError;
pub use message::{CompactBlock, PrefilledTransaction, MAX_BLOCK_TX_COUNT};
pub use reconstruction::{FillStatus, PartialBlock};
pub use requests::{matching_transactions, BlockTxnRequest, BlockTxnResponse};
pub use short_id::{compute_short_id, ShortIdIndex, ShortIdKey, ShortTxId};
