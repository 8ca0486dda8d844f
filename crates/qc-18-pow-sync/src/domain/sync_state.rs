//! Sync status, the sync state store, and the driver's liveness clock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for "peer lag unknown".
pub const UNKNOWN_EPOCH_DIFF: i64 = -1;

/// The node's belief about whether its local chain matches the network's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Behind the network, or unknown. Mining is off.
    Unsynced,
    /// Actively downloading blocks from a peer. Mining is off.
    Syncing,
    /// Caught up. Mining runs against the chain head.
    Synced,
    /// Reserved. Detection and recovery are not defined.
    Forked,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStatus::Unsynced => "unsynced",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Forked => "forked",
        };
        f.write_str(name)
    }
}

/// Current sync status plus the peer-lag estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncStateStore {
    /// Active status.
    pub status: SyncStatus,
    /// Consensus rounds behind peers, [`UNKNOWN_EPOCH_DIFF`] when unknown.
    pub epoch_diff: i64,
}

impl SyncStateStore {
    /// Fresh store: unsynced, lag unknown.
    pub fn new() -> Self {
        Self {
            status: SyncStatus::Unsynced,
            epoch_diff: UNKNOWN_EPOCH_DIFF,
        }
    }

    /// Whether the peer lag is known.
    pub fn epoch_diff_known(&self) -> bool {
        self.epoch_diff != UNKNOWN_EPOCH_DIFF
    }
}

impl Default for SyncStateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Liveness timestamps (unix seconds). Process-lifetime only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverClock {
    /// Last time a mining cycle was (re)started via `Synced`.
    pub last_pow_cycle: u64,
    /// Last time `Unsynced` was entered.
    pub last_bk_time: u64,
    /// Last time `Syncing` was entered.
    pub last_pb_time: u64,
}

impl DriverClock {
    /// Seconds since the last mining cycle, saturating at zero.
    pub fn since_pow_cycle(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_pow_cycle)
    }

    /// Seconds since `Unsynced` was entered.
    pub fn since_unsynced(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_bk_time)
    }

    /// Seconds since `Syncing` was entered.
    pub fn since_syncing(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_pb_time)
    }
}

/// Status and liveness clock, written together so no reader sees one
/// updated without the other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverState {
    /// Status and peer lag.
    pub store: SyncStateStore,
    /// Liveness timestamps.
    pub clock: DriverClock,
}

impl DriverState {
    /// Store `status` and stamp the clock field its entry action owns.
    pub fn enter(&mut self, status: SyncStatus, now: u64) {
        self.store.status = status;
        match status {
            SyncStatus::Unsynced => self.clock.last_bk_time = now,
            SyncStatus::Syncing => self.clock.last_pb_time = now,
            SyncStatus::Synced => self.clock.last_pow_cycle = now,
            SyncStatus::Forked => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_starts_unsynced_with_unknown_lag() {
        let store = SyncStateStore::default();
        assert_eq!(store.status, SyncStatus::Unsynced);
        assert_eq!(store.epoch_diff, UNKNOWN_EPOCH_DIFF);
        assert!(!store.epoch_diff_known());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SyncStatus::Synced.to_string(), "synced");
        assert_eq!(SyncStatus::Forked.to_string(), "forked");
    }

    #[test]
    fn test_clock_elapsed_saturates() {
        let clock = DriverClock {
            last_pow_cycle: 100,
            last_bk_time: 200,
            last_pb_time: 300,
        };
        assert_eq!(clock.since_pow_cycle(195), 95);
        assert_eq!(clock.since_unsynced(150), 0);
        assert_eq!(clock.since_syncing(361), 61);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SyncStatus::Syncing).unwrap();
        assert_eq!(json, "\"syncing\"");
    }

    #[test]
    fn test_enter_stamps_only_owned_field() {
        let mut state = DriverState::default();

        state.enter(SyncStatus::Syncing, 50);
        assert_eq!(state.store.status, SyncStatus::Syncing);
        assert_eq!(state.clock.last_pb_time, 50);
        assert_eq!(state.clock.last_bk_time, 0);

        state.enter(SyncStatus::Forked, 90);
        assert_eq!(state.store.status, SyncStatus::Forked);
        assert_eq!(
            state.clock,
            DriverClock {
                last_pow_cycle: 0,
                last_bk_time: 0,
                last_pb_time: 50,
            }
        );
    }
}
