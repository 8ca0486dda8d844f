//! Unsynced recovery loop and the download trigger.

use super::ConsensusDriver;
use crate::deferred::DeferredTask;
use crate::domain::SyncStatus;
use crate::ports::{ChainState, MiningWorker, PeerNetwork, SyncDriverApi};
use std::time::Duration;
use tracing::{info, warn};

impl<C, M, N> ConsensusDriver<C, M, N>
where
    C: ChainState + 'static,
    M: MiningWorker + 'static,
    N: PeerNetwork + 'static,
{
    /// Cancel any armed recovery run and arm a new one after `delay`.
    pub fn restart_unsynced_recovery(&self, delay: Duration) {
        info!("[qc-18] Restarting unsynced logic in {:?}", delay);
        self.arm_timer(&self.unsynced_recovery, delay, |driver| async move {
            driver.run_unsynced_recovery().await;
        });
    }

    /// Whether a recovery run or download trigger is pending
    pub fn recovery_armed(&self) -> bool {
        self.unsynced_recovery.is_armed()
    }

    /// Probe peers and arm the download trigger, unless already synced.
    pub async fn run_unsynced_recovery(&self) {
        if self.status() == SyncStatus::Synced {
            return;
        }

        if let Err(e) = self.network.broadcast_sync_probe().await {
            warn!("[qc-18] sync probe failed: {}", e);
        }
        self.deferred.schedule(DeferredTask::RequestPeerHeights);

        self.arm_timer(
            &self.unsynced_recovery,
            self.config.download_delay(),
            |driver| async move {
                driver.start_download().await;
            },
        );
    }

    /// Move to `Syncing` and fetch from a random peer, or to `Synced` when
    /// there is nobody to sync against.
    pub async fn start_download(&self) {
        if self.status() == SyncStatus::Synced {
            return;
        }

        info!("[qc-18] Checking download..");

        if self.network.live_peer_count().await == 0 {
            warn!("[qc-18] No connected peers. Moving to synced state");
            self.transition(SyncStatus::Synced);
            return;
        }

        self.transition(SyncStatus::Syncing);
        let from_height = self.chain.height().saturating_add(1);
        info!("[qc-18] Initializing download from {}", from_height);
        if let Err(e) = self.network.fetch_blocks_from_random_peer(from_height).await {
            warn!("[qc-18] block fetch from #{} failed: {}", from_height, e);
        }
    }
}
