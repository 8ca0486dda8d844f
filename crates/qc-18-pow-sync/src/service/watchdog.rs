//! Liveness watchdog and cold-start bootstrap.
//!
//! Each tick runs two checks in order. The PoW-stall check runs first and,
//! whenever the mining cycle is stale, ends the tick: the sync-timeout
//! check is skipped even if the stall check did not fire a transition.

use super::ConsensusDriver;
use crate::domain::{SyncStatus, UNKNOWN_EPOCH_DIFF};
use crate::ports::{ChainState, MiningWorker, PeerNetwork, SyncDriverApi};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of one watchdog evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LivenessVerdict {
    /// Nothing stalled
    Healthy,
    /// Mining cycle is stale but no recovery applies yet; the sync-timeout
    /// check was skipped
    PowStalled,
    /// Unsynced for too long with a stale mining cycle; forced `Synced`
    ForcedSynced,
    /// `Syncing` hung; fell back to `Unsynced`
    SyncTimedOut,
}

impl<C, M, N> ConsensusDriver<C, M, N>
where
    C: ChainState + 'static,
    M: MiningWorker + 'static,
    N: PeerNetwork + 'static,
{
    /// Evaluate both liveness checks once, forcing a transition if needed.
    ///
    /// Does not rearm the watchdog.
    pub fn check_liveness(&self) -> LivenessVerdict {
        let now = self.clock.now();
        let state = *self.state.read();

        if state.clock.since_pow_cycle(now) > self.config.pow_stall_secs {
            if state.store.status == SyncStatus::Unsynced
                && state.clock.since_unsynced(now) > self.config.unsynced_grace_secs
            {
                info!("[qc-18] POW cycle activated by liveness watchdog");
                self.transition(SyncStatus::Synced);
                self.metrics.record_watchdog_recovery();
                return LivenessVerdict::ForcedSynced;
            }
            return LivenessVerdict::PowStalled;
        }

        if state.store.status == SyncStatus::Syncing
            && state.clock.since_syncing(now) > self.config.syncing_timeout_secs
        {
            warn!(
                "[qc-18] no sync progress for {}s, falling back to unsynced",
                state.clock.since_syncing(now)
            );
            self.transition(SyncStatus::Unsynced);
            self.state.write().store.epoch_diff = UNKNOWN_EPOCH_DIFF;
            self.metrics.record_watchdog_recovery();
            return LivenessVerdict::SyncTimedOut;
        }

        LivenessVerdict::Healthy
    }

    /// Cancel the watchdog and arm it to fire after `delay`.
    pub fn restart_watchdog(&self, delay: Duration) {
        self.arm_timer(&self.monitor, delay, |driver| async move {
            driver.on_watchdog_tick();
        });
    }

    /// Cancel the watchdog. No-op if it is not armed.
    pub fn stop_watchdog(&self) {
        self.monitor.cancel();
    }

    /// Whether the watchdog is armed
    pub fn watchdog_armed(&self) -> bool {
        self.monitor.is_armed()
    }

    fn on_watchdog_tick(&self) {
        let verdict = self.check_liveness();
        debug!("[qc-18] watchdog tick: {:?}", verdict);
        self.restart_watchdog(self.config.watchdog_period());
    }

    /// Arm the cold-start sequence: after the bootstrap delay, schedule an
    /// unconditional `Synced` after the settle delay.
    pub(crate) fn schedule_bootstrap(&self) {
        self.arm_timer(
            &self.bootstrap,
            self.config.bootstrap_delay(),
            |driver| async move {
                driver.initialize_pow();
            },
        );
    }

    fn initialize_pow(&self) {
        debug!(
            "[qc-18] assuming synced in {}s unless told otherwise",
            self.config.bootstrap_settle_secs
        );
        self.arm_timer(
            &self.bootstrap,
            self.config.bootstrap_settle(),
            |driver| async move {
                driver.transition(SyncStatus::Synced);
            },
        );
    }
}
