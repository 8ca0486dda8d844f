//! Inbound ports (driving side - API)

use crate::domain::{Block, SyncStatus};
use serde::Serialize;

/// Primary port: what the rest of the node calls into
pub trait SyncDriverApi: Send + Sync {
    /// Enter `status` and run its entry action
    fn transition(&self, status: SyncStatus);

    /// Hand a newly received or mined block to chain state.
    ///
    /// Returns whether the block was accepted.
    fn ingest(&self, block: Block) -> bool;

    /// Fast-path synced detection from a gossiped block timestamp
    fn check_freshness(&self, block_timestamp: u64) -> bool;

    /// Record the networking layer's peer-lag estimate
    fn set_epoch_diff(&self, epoch_diff: i64);

    /// Current status
    fn status(&self) -> SyncStatus;

    /// Full status snapshot
    fn snapshot(&self) -> DriverStatus;
}

/// Point-in-time view of the driver
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DriverStatus {
    /// Current sync status
    pub status: SyncStatus,

    /// Peer-lag estimate, -1 when unknown
    pub epoch_diff: i64,

    /// Last mining cycle start (unix seconds)
    pub last_pow_cycle: u64,

    /// Last time `Unsynced` was entered
    pub last_bk_time: u64,

    /// Last time `Syncing` was entered
    pub last_pb_time: u64,

    /// Whether the mining worker has a job in flight
    pub mining_active: bool,
}
