//! Consensus driver - the sync state machine
//!
//! # Entry actions
//!
//! Every transition stores the new status and then runs that status's
//! entry action, even when the status did not change:
//!
//! | Status   | Entry action                                              |
//! |----------|-----------------------------------------------------------|
//! | Unsynced | cancel mining, stamp `last_bk_time`, restart recovery now |
//! | Syncing  | cancel mining, stamp `last_pb_time`                       |
//! | Synced   | stamp `last_pow_cycle`, mine on the chain head            |
//! | Forked   | nothing                                                   |
//!
//! # Concurrency
//!
//! Status and clock live behind one `RwLock` and are written together.
//! The mining worker is reachable only through [`MiningCoordinator`]
//! sessions. `transition` holds one session across the status write and the
//! entry action, and `ingest` holds one across `add_block` and the restart
//! decision. The session is always taken before the state lock. Broadcasts
//! are deferred to [`DeferredQueue`] after the session is released.

mod recovery;
mod watchdog;


pub use watchdog::LivenessVerdict;

use crate::config::SyncDriverConfig;
use crate::deferred::{DeferredQueue, DeferredTask};
use crate::domain::{Block, DriverState, SyncStatus};
use crate::error::{Result, SyncDriverError};
use crate::metrics::DriverMetrics;
use crate::mining::{MiningCoordinator, MiningSession};
use crate::ports::{ChainState, DriverStatus, MiningWorker, PeerNetwork, SyncDriverApi, TimeSource};
use crate::timer::TimerSlot;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Dependencies for [`ConsensusDriver`]
pub struct DriverDependencies<C, M, N> {
    /// Local chain
    pub chain: Arc<C>,
    /// Mining worker, reached only through the driver's coordinator
    pub miner: Arc<M>,
    /// Peer layer
    pub network: Arc<N>,
    /// Drives the liveness clock
    pub clock: Arc<dyn TimeSource>,
    /// Answers freshness checks; must resist local clock tampering
    pub trusted_time: Arc<dyn TimeSource>,
    /// Timer and mining settings
    pub config: SyncDriverConfig,
}

/// Sync and consensus driver for a proof-of-work node.
pub struct ConsensusDriver<C, M, N>
where
    C: ChainState + 'static,
    M: MiningWorker + 'static,
    N: PeerNetwork + 'static,
{
    chain: Arc<C>,
    mining: MiningCoordinator<M>,
    network: Arc<N>,
    clock: Arc<dyn TimeSource>,
    trusted_time: Arc<dyn TimeSource>,
    config: SyncDriverConfig,
    state: RwLock<DriverState>,
    monitor: TimerSlot,
    unsynced_recovery: TimerSlot,
    bootstrap: TimerSlot,
    deferred: DeferredQueue,
    metrics: DriverMetrics,
    runtime: Handle,
    this: Weak<Self>,
}

impl<C, M, N> ConsensusDriver<C, M, N>
where
    C: ChainState + 'static,
    M: MiningWorker + 'static,
    N: PeerNetwork + 'static,
{
    /// Create a driver bound to the current tokio runtime.
    ///
    /// The driver starts `Unsynced` with an unknown epoch diff and no timers
    /// armed. Call [`start`](Self::start) to arm them.
    pub fn new(deps: DriverDependencies<C, M, N>) -> Result<Arc<Self>> {
        deps.config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SyncDriverError::NoRuntime)?;

        info!("[qc-18] Initializing PoW sync driver");
        info!("  Mining enabled: {}", deps.config.mining_enabled);
        info!(
            "  Minimum minting delay: {}s",
            deps.config.minimum_minting_delay_secs
        );

        Ok(Arc::new_cyclic(|this| Self {
            chain: deps.chain,
            mining: MiningCoordinator::new(deps.miner),
            network: deps.network,
            clock: deps.clock,
            trusted_time: deps.trusted_time,
            config: deps.config,
            state: RwLock::new(DriverState::default()),
            monitor: TimerSlot::new("monitor", runtime.clone()),
            unsynced_recovery: TimerSlot::new("unsynced-recovery", runtime.clone()),
            bootstrap: TimerSlot::new("bootstrap", runtime.clone()),
            deferred: DeferredQueue::new(),
            metrics: DriverMetrics::new(),
            runtime,
            this: this.clone(),
        }))
    }

    /// Arm the watchdog and the cold-start bootstrap, and start draining
    /// deferred work.
    pub fn start(&self) {
        info!("[qc-18] Starting sync driver");
        self.spawn_deferred_worker();
        self.restart_watchdog(self.config.watchdog_initial_delay());
        self.schedule_bootstrap();
    }

    /// Cancel every timer and the current mining job.
    pub fn shutdown(&self) {
        info!("[qc-18] Stopping sync driver");
        self.monitor.cancel();
        self.unsynced_recovery.cancel();
        self.bootstrap.cancel();
        self.mining.cancel();
    }

    /// Spawn the single consumer of the deferred queue.
    ///
    /// Returns `false` if a consumer was already spawned.
    pub fn spawn_deferred_worker(&self) -> bool {
        let Some(mut receiver) = self.deferred.take_receiver() else {
            return false;
        };
        let this = self.this.clone();
        self.runtime.spawn(async move {
            while let Some(task) = receiver.recv().await {
                let Some(driver) = this.upgrade() else {
                    break;
                };
                driver.run_deferred(task).await;
            }
            debug!("[qc-18] deferred worker stopped");
        });
        true
    }

    /// Start mining on `parent_block` in a session of its own.
    pub fn mine_next(&self, parent_block: &Block) -> Result<()> {
        let session = self.mining.session();
        self.mine_on(&session, parent_block)
    }

    /// Driver configuration
    pub fn config(&self) -> &SyncDriverConfig {
        &self.config
    }

    /// Driver counters
    pub fn metrics(&self) -> &DriverMetrics {
        &self.metrics
    }

    /// Start a mining job inside an already-open session.
    ///
    /// No-op when mining is disabled.
    fn mine_on(&self, session: &MiningSession<'_, M>, parent_block: &Block) -> Result<()> {
        if !self.config.mining_enabled {
            return Ok(());
        }

        let metadata = self
            .chain
            .get_block_metadata(&parent_block.headerhash)
            .ok_or(SyncDriverError::MissingMetadata(parent_block.headerhash))?;

        let height = parent_block.block_number.saturating_add(1);
        info!("[qc-18] ⛏️  Mining block #{}", height);
        session.start(self.chain.tx_pool(), parent_block, metadata.block_difficulty);
        self.metrics.record_mining_start();
        Ok(())
    }

    async fn run_deferred(&self, task: DeferredTask) {
        match task {
            DeferredTask::BroadcastBlock(block) => self.broadcast_block(&block).await,
            DeferredTask::RequestPeerHeights => {
                if let Err(e) = self.network.request_peer_heights().await {
                    warn!("[qc-18] peer height request failed: {}", e);
                }
            }
        }
    }

    /// Relay `block` to peers, but only once synced.
    async fn broadcast_block(&self, block: &Block) {
        let status = self.status();
        if status != SyncStatus::Synced {
            debug!(
                "[qc-18] not relaying #{} while {}",
                block.block_number, status
            );
            return;
        }

        match self.network.broadcast_block(block).await {
            Ok(()) => self.metrics.record_broadcast(),
            Err(e) => warn!(
                "[qc-18] failed to relay #{} {}: {}",
                block.block_number,
                block.short_hash(),
                SyncDriverError::Network(e)
            ),
        }
    }

    /// Arm `slot` to run `task` on this driver after `delay`.
    ///
    /// The task holds only a weak reference until it fires.
    fn arm_timer<F, Fut>(&self, slot: &TimerSlot, delay: Duration, task: F)
    where
        F: FnOnce(Arc<Self>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let this = self.this.clone();
        slot.arm(delay, async move {
            if let Some(driver) = this.upgrade() {
                task(driver).await;
            }
        });
    }
}

impl<C, M, N> SyncDriverApi for ConsensusDriver<C, M, N>
where
    C: ChainState + 'static,
    M: MiningWorker + 'static,
    N: PeerNetwork + 'static,
{
    fn transition(&self, status: SyncStatus) {
        // The session spans the status write and the entry action so a
        // concurrent transition cannot land between them.
        let session = self.mining.session();
        let now = self.clock.now();
        self.state.write().enter(status, now);
        self.metrics.record_transition();
        info!("[qc-18] Status changed to {}", status);

        match status {
            SyncStatus::Unsynced => {
                session.cancel();
                self.restart_unsynced_recovery(Duration::ZERO);
            }
            SyncStatus::Syncing => {
                session.cancel();
            }
            SyncStatus::Synced => {
                let head = self.chain.last_block();
                if let Err(e) = self.mine_on(&session, &head) {
                    warn!("[qc-18] cannot start mining on #{}: {}", head.block_number, e);
                }
            }
            SyncStatus::Forked => {}
        }
    }

    fn ingest(&self, block: Block) -> bool {
        debug!("[qc-18] Checking miner lock");
        let accepted = {
            let session = self.mining.session();
            debug!("[qc-18] Inside add_block");
            let accepted = self.chain.add_block(&block);

            let head_changed = self.chain.head_changed();
            if head_changed || !session.is_running() {
                let head = self.chain.last_block();
                if let Err(e) = self.mine_on(&session, &head) {
                    warn!("[qc-18] cannot restart mining on #{}: {}", head.block_number, e);
                }
            }
            accepted
        };
        self.metrics.record_ingest(accepted);

        if !accepted {
            debug!(
                "[qc-18] Block rejected #{} {}",
                block.block_number,
                hex::encode(block.headerhash.as_bytes())
            );
            return false;
        }

        self.deferred.schedule(DeferredTask::BroadcastBlock(block));
        true
    }

    fn check_freshness(&self, block_timestamp: u64) -> bool {
        let threshold = block_timestamp.saturating_add(self.config.minimum_minting_delay_secs);
        if threshold <= self.trusted_time.now() {
            self.transition(SyncStatus::Synced);
            return true;
        }
        false
    }

    fn set_epoch_diff(&self, epoch_diff: i64) {
        self.state.write().store.epoch_diff = epoch_diff;
    }

    fn status(&self) -> SyncStatus {
        self.state.read().store.status
    }

    fn snapshot(&self) -> DriverStatus {
        let state = *self.state.read();
        DriverStatus {
            status: state.store.status,
            epoch_diff: state.store.epoch_diff,
            last_pow_cycle: state.clock.last_pow_cycle,
            last_bk_time: state.clock.last_bk_time,
            last_pb_time: state.clock.last_pb_time,
            mining_active: self.mining.is_running(),
        }
    }
}
