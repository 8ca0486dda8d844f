//! Domain layer: pure data, no I/O.

pub mod entities;
pub mod sync_state;

pub use entities::{Block, BlockMetadata, TxPoolSnapshot};
pub use sync_state::{DriverClock, DriverState, SyncStateStore, SyncStatus, UNKNOWN_EPOCH_DIFF};
