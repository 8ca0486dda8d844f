//! Outbound ports (driven side - SPI)

use crate::domain::{Block, BlockMetadata, TxPoolSnapshot};
use async_trait::async_trait;
use primitive_types::{H256, U256};

/// Port: local chain state (validation + persistence live behind it)
pub trait ChainState: Send + Sync {
    /// Validate and store a block. `false` means rejected.
    fn add_block(&self, block: &Block) -> bool;

    /// Whether the canonical head moved and mining must restart.
    ///
    /// The collaborator clears this signal itself.
    fn head_changed(&self) -> bool;

    /// Current chain head
    fn last_block(&self) -> Block;

    /// Current chain height
    fn height(&self) -> u64;

    /// Metadata for a stored block
    fn get_block_metadata(&self, headerhash: &H256) -> Option<BlockMetadata>;

    /// Pending transactions to mine into the next block
    fn tx_pool(&self) -> TxPoolSnapshot;
}

/// Port: the proof-of-work search worker
///
/// The search itself runs off the event loop. Starting a job supersedes
/// any job in flight; cancelling discards its result.
pub trait MiningWorker: Send + Sync {
    /// Start searching for a child of `parent_block`
    fn start_mining(&self, tx_pool: TxPoolSnapshot, parent_block: &Block, difficulty: U256);

    /// Stop the current job and drop its result
    fn cancel(&self);

    /// Whether a job is in flight
    fn is_running(&self) -> bool;
}

/// Port: peer networking
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Ask every peer for its sync state
    async fn broadcast_sync_probe(&self) -> Result<(), String>;

    /// Ask every peer for its block height
    async fn request_peer_heights(&self) -> Result<(), String>;

    /// Fetch blocks from `from_height` onwards from one randomly chosen peer
    async fn fetch_blocks_from_random_peer(&self, from_height: u64) -> Result<(), String>;

    /// Relay a block to peers
    async fn broadcast_block(&self, block: &Block) -> Result<(), String>;

    /// Number of live peer connections
    async fn live_peer_count(&self) -> usize;
}

/// Port: wall-clock source in unix seconds
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds
    fn now(&self) -> u64;
}
