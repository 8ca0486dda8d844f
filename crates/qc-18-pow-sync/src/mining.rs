//! Mining coordinator: the only way to reach the mining worker.
//!
//! Every start/cancel/is-running call goes through a [`MiningSession`],
//! which holds the coordinator's mutex. The ingest path keeps one session
//! open across `add_block` and the restart decision, so a block mined by
//! the worker and a block received from the network can never interleave
//! their {chain-add, mining-restart} steps.

use crate::domain::{Block, TxPoolSnapshot};
use crate::ports::MiningWorker;
use parking_lot::{Mutex, MutexGuard};
use primitive_types::U256;
use std::sync::Arc;
use tracing::debug;

/// Control surface over the mining worker.
pub struct MiningCoordinator<M: MiningWorker> {
    worker: Arc<M>,
    lock: Mutex<()>,
}

impl<M: MiningWorker> MiningCoordinator<M> {
    /// Wrap a worker.
    pub fn new(worker: Arc<M>) -> Self {
        Self {
            worker,
            lock: Mutex::new(()),
        }
    }

    /// Enter the critical section. Blocks until any other session ends.
    pub fn session(&self) -> MiningSession<'_, M> {
        MiningSession {
            worker: &self.worker,
            _guard: self.lock.lock(),
        }
    }

    /// Cancel the current job in a one-call session.
    pub fn cancel(&self) {
        self.session().cancel();
    }

    /// Whether a job is running, read inside a one-call session.
    pub fn is_running(&self) -> bool {
        self.session().is_running()
    }
}

/// Exclusive access to the mining worker for the lifetime of the guard.
pub struct MiningSession<'a, M: MiningWorker> {
    worker: &'a Arc<M>,
    _guard: MutexGuard<'a, ()>,
}

impl<M: MiningWorker> MiningSession<'_, M> {
    /// Start a job on `parent_block`, superseding any job in flight.
    pub fn start(&self, tx_pool: TxPoolSnapshot, parent_block: &Block, difficulty: U256) {
        debug!(
            "[qc-18] starting mining job on #{} ({} pending txs)",
            parent_block.block_number,
            tx_pool.len()
        );
        self.worker.start_mining(tx_pool, parent_block, difficulty);
    }

    /// Stop the current job and discard its result.
    pub fn cancel(&self) {
        self.worker.cancel();
    }

    /// Whether a job is in flight.
    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryMiner;
    use primitive_types::H256;

    #[test]
    fn test_start_then_cancel() {
        let miner = Arc::new(InMemoryMiner::new());
        let coordinator = MiningCoordinator::new(Arc::clone(&miner));
        let parent = Block::new(H256::repeat_byte(2), 10, 1_000);

        coordinator
            .session()
            .start(TxPoolSnapshot::default(), &parent, U256::from(1000));
        assert!(coordinator.is_running());
        assert_eq!(miner.start_count(), 1);
        assert_eq!(miner.current_parent(), Some(parent));

        coordinator.cancel();
        assert!(!coordinator.is_running());
    }

    #[test]
    fn test_new_job_supersedes_old() {
        let miner = Arc::new(InMemoryMiner::new());
        let coordinator = MiningCoordinator::new(Arc::clone(&miner));
        let first = Block::new(H256::repeat_byte(1), 1, 1_000);
        let second = Block::new(H256::repeat_byte(2), 2, 1_010);

        {
            let session = coordinator.session();
            session.start(TxPoolSnapshot::default(), &first, U256::one());
            session.start(TxPoolSnapshot::default(), &second, U256::one());
        }

        assert_eq!(miner.start_count(), 2);
        assert_eq!(miner.current_parent(), Some(second));
        assert!(coordinator.is_running());
    }
}
