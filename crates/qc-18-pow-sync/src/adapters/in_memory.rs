//! In-memory adapters for the outbound ports.
//!
//! These back the demo binary and the test suites. The chain accepts only
//! blocks that extend its tip; the miner and network record what they were
//! asked to do.

use crate::domain::{Block, BlockMetadata, TxPoolSnapshot};
use crate::ports::{ChainState, MiningWorker, PeerNetwork, TimeSource};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use primitive_types::{H256, U256};
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::debug;

// ============================================================================
// InMemoryChain
// ============================================================================

/// Linear chain held in memory.
pub struct InMemoryChain {
    blocks: RwLock<HashMap<H256, BlockMetadata>>,
    head: RwLock<Block>,
    head_changed: AtomicBool,
    difficulty: U256,
    pending: Mutex<TxPoolSnapshot>,
}

impl InMemoryChain {
    /// Chain containing only `genesis`. Every block is mined at `difficulty`.
    pub fn new(genesis: Block, difficulty: U256) -> Self {
        let mut blocks = HashMap::new();
        blocks.insert(
            genesis.headerhash,
            BlockMetadata {
                block_difficulty: difficulty,
            },
        );
        Self {
            blocks: RwLock::new(blocks),
            head: RwLock::new(genesis),
            head_changed: AtomicBool::new(false),
            difficulty,
            pending: Mutex::new(TxPoolSnapshot::default()),
        }
    }

    /// Queue a transaction for the next mining job.
    pub fn push_transaction(&self, tx: Vec<u8>) {
        self.pending.lock().transactions.push(tx);
    }

    /// Forget a block's metadata (simulates a pruned or corrupt store).
    pub fn drop_metadata(&self, headerhash: &H256) {
        self.blocks.write().remove(headerhash);
    }

    /// Build the block that would extend the current tip.
    pub fn next_block(&self, timestamp: u64) -> Block {
        let head = self.head.read();
        let number = head.block_number + 1;
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&number.to_be_bytes());
        hash[8..16].copy_from_slice(&timestamp.to_be_bytes());
        Block::new(H256::from(hash), number, timestamp)
    }
}

impl ChainState for InMemoryChain {
    fn add_block(&self, block: &Block) -> bool {
        self.head_changed.store(false, Ordering::SeqCst);

        let mut head = self.head.write();
        let mut blocks = self.blocks.write();
        if blocks.contains_key(&block.headerhash) || block.block_number != head.block_number + 1 {
            debug!(
                "[qc-18] in-memory chain rejects #{} (tip #{})",
                block.block_number, head.block_number
            );
            return false;
        }

        blocks.insert(
            block.headerhash,
            BlockMetadata {
                block_difficulty: self.difficulty,
            },
        );
        *head = block.clone();
        self.head_changed.store(true, Ordering::SeqCst);
        true
    }

    fn head_changed(&self) -> bool {
        self.head_changed.load(Ordering::SeqCst)
    }

    fn last_block(&self) -> Block {
        self.head.read().clone()
    }

    fn height(&self) -> u64 {
        self.head.read().block_number
    }

    fn get_block_metadata(&self, headerhash: &H256) -> Option<BlockMetadata> {
        self.blocks.read().get(headerhash).copied()
    }

    fn tx_pool(&self) -> TxPoolSnapshot {
        self.pending.lock().clone()
    }
}

// ============================================================================
// InMemoryMiner
// ============================================================================

/// Miner that records jobs instead of hashing.
#[derive(Default)]
pub struct InMemoryMiner {
    running: AtomicBool,
    starts: AtomicU64,
    cancels: AtomicU64,
    parent: Mutex<Option<Block>>,
    difficulty: Mutex<Option<U256>>,
}

impl InMemoryMiner {
    /// Idle miner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `start_mining` calls.
    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of `cancel` calls.
    pub fn cancel_count(&self) -> u64 {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Parent of the most recent job.
    pub fn current_parent(&self) -> Option<Block> {
        self.parent.lock().clone()
    }

    /// Difficulty of the most recent job.
    pub fn current_difficulty(&self) -> Option<U256> {
        *self.difficulty.lock()
    }

    /// Mark the running job as finished, as a real worker does after
    /// finding a block.
    pub fn finish_job(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl MiningWorker for InMemoryMiner {
    fn start_mining(&self, _tx_pool: TxPoolSnapshot, parent_block: &Block, difficulty: U256) {
        *self.parent.lock() = Some(parent_block.clone());
        *self.difficulty.lock() = Some(difficulty);
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

// ============================================================================
// InMemoryNetwork
// ============================================================================

/// Network with a fixed peer list that records outgoing requests.
#[derive(Default)]
pub struct InMemoryNetwork {
    peers: RwLock<Vec<String>>,
    probes: AtomicUsize,
    height_requests: AtomicUsize,
    fetches: Mutex<Vec<(String, u64)>>,
    broadcasts: Mutex<Vec<Block>>,
}

impl InMemoryNetwork {
    /// Network with no peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Network with the given peers.
    pub fn with_peers<I, S>(peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let network = Self::new();
        *network.peers.write() = peers.into_iter().map(Into::into).collect();
        network
    }

    /// Replace the peer list.
    pub fn set_peers(&self, peers: Vec<String>) {
        *self.peers.write() = peers;
    }

    /// Sync-state probes sent.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Peer-height requests sent.
    pub fn height_request_count(&self) -> usize {
        self.height_requests.load(Ordering::SeqCst)
    }

    /// `(peer, from_height)` for every block fetch issued.
    pub fn fetches(&self) -> Vec<(String, u64)> {
        self.fetches.lock().clone()
    }

    /// Blocks relayed to peers.
    pub fn broadcasts(&self) -> Vec<Block> {
        self.broadcasts.lock().clone()
    }
}

#[async_trait]
impl PeerNetwork for InMemoryNetwork {
    async fn broadcast_sync_probe(&self) -> Result<(), String> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn request_peer_heights(&self) -> Result<(), String> {
        self.height_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_blocks_from_random_peer(&self, from_height: u64) -> Result<(), String> {
        let peer = self
            .peers
            .read()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| "no peers to fetch from".to_string())?;
        debug!("[qc-18] fetching from {} starting at #{}", peer, from_height);
        self.fetches.lock().push((peer, from_height));
        Ok(())
    }

    async fn broadcast_block(&self, block: &Block) -> Result<(), String> {
        self.broadcasts.lock().push(block.clone());
        Ok(())
    }

    async fn live_peer_count(&self) -> usize {
        self.peers.read().len()
    }
}

// ============================================================================
// Time sources
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock fixed at `now`.
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Production time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> Block {
        Block::new(H256::zero(), 0, 1_700_000_000)
    }

    #[test]
    fn test_chain_accepts_tip_extension() {
        let chain = InMemoryChain::new(genesis(), U256::from(500));
        let next = chain.next_block(1_700_000_060);

        assert!(chain.add_block(&next));
        assert!(chain.head_changed());
        assert_eq!(chain.height(), 1);
        assert_eq!(chain.last_block(), next);
        assert_eq!(
            chain.get_block_metadata(&next.headerhash).unwrap().block_difficulty,
            U256::from(500)
        );
    }

    #[test]
    fn test_chain_rejects_duplicate_and_clears_signal() {
        let chain = InMemoryChain::new(genesis(), U256::one());
        let next = chain.next_block(1_700_000_060);

        assert!(chain.add_block(&next));
        assert!(!chain.add_block(&next));
        assert!(!chain.head_changed());
        assert_eq!(chain.height(), 1);
    }

    #[test]
    fn test_chain_rejects_gap() {
        let chain = InMemoryChain::new(genesis(), U256::one());
        let orphan = Block::new(H256::repeat_byte(9), 5, 1_700_000_300);
        assert!(!chain.add_block(&orphan));
    }

    #[tokio::test]
    async fn test_fetch_picks_a_known_peer() {
        let network = InMemoryNetwork::with_peers(["a", "b", "c"]);
        network.fetch_blocks_from_random_peer(42).await.unwrap();

        let fetches = network.fetches();
        assert_eq!(fetches.len(), 1);
        assert!(["a", "b", "c"].contains(&fetches[0].0.as_str()));
        assert_eq!(fetches[0].1, 42);
    }

    #[tokio::test]
    async fn test_fetch_without_peers_fails() {
        let network = InMemoryNetwork::new();
        assert!(network.fetch_blocks_from_random_peer(1).await.is_err());
        assert_eq!(network.live_peer_count().await, 0);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        clock.advance(20);
        assert_eq!(clock.now(), 120);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_system_time_source() {
        assert!(SystemTimeSource.now() > 0);
    }
}
