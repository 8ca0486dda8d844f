//! Chain entities the driver reads. Everything else about a block is
//! owned by the chain-state collaborator.

use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};

/// The slice of a block the sync driver cares about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Header hash.
    pub headerhash: H256,
    /// Height of this block.
    pub block_number: u64,
    /// Block timestamp (unix seconds).
    pub timestamp: u64,
}

impl Block {
    /// Create a block descriptor.
    pub fn new(headerhash: H256, block_number: u64, timestamp: u64) -> Self {
        Self {
            headerhash,
            block_number,
            timestamp,
        }
    }

    /// Short hex form of the header hash for log lines.
    pub fn short_hash(&self) -> String {
        hex::encode(&self.headerhash.as_bytes()[..8])
    }
}

/// Per-block metadata kept by the chain-state collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockMetadata {
    /// Difficulty the child of this block must be mined at.
    pub block_difficulty: U256,
}

/// Pending transactions handed to the mining worker with each job.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxPoolSnapshot {
    /// Encoded transactions, highest priority first.
    pub transactions: Vec<Vec<u8>>,
}

impl TxPoolSnapshot {
    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash_is_first_eight_bytes() {
        let block = Block::new(H256::repeat_byte(0xab), 7, 1_700_000_000);
        assert_eq!(block.short_hash(), "abababababababab");
    }

    #[test]
    fn test_empty_pool() {
        let pool = TxPoolSnapshot::default();
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }
}
