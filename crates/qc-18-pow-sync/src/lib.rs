//! # Quantum Chain - PoW Sync Driver (Subsystem 18)
//!
//! **Bounded Context:** Chain Synchronization & Mining Coordination
//! **Architecture Compliance:** DDD + Hexagonal + TDD
//!
//! ## Purpose
//!
//! The sync driver decides when a proof-of-work node is caught up with the
//! network and may mine, and when it must stop mining and catch up:
//! - A four-state machine (`Unsynced`, `Syncing`, `Synced`, `Forked`) with
//!   entry actions that start and cancel mining
//! - A liveness watchdog that forces progress when sync stalls
//! - An unsynced recovery loop that probes peers and triggers block download
//! - A serialized ingest path so chain additions and mining restarts never
//!   interleave
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - In-memory chain, miner, network, clocks          │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: SyncDriverApi                           │
//! │  - Outbound: ChainState, MiningWorker,              │
//! │              PeerNetwork, TimeSource                │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Service                                            │
//! │  - ConsensusDriver (state machine, watchdog,        │
//! │    recovery loop, ingest, freshness)                │
//! │  - MiningCoordinator, TimerSlot, DeferredQueue      │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Data)                         │
//! │  - SyncStatus, SyncStateStore, DriverClock, Block   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Mining only when synced**: entering `Unsynced` or `Syncing` cancels
//!    the current job; only `Synced` starts one
//! 2. **Serialized ingest**: `add_block` and the restart decision run under
//!    one mining session
//! 3. **Relay only when synced**: accepted blocks are broadcast from a
//!    deferred task, and only if the node is `Synced` when it runs
//! 4. **Trusted freshness**: `check_freshness` compares against the trusted
//!    time source, never the local clock
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let driver = ConsensusDriver::new(DriverDependencies {
//!     chain, miner, network,
//!     clock: Arc::new(SystemTimeSource),
//!     trusted_time: Arc::new(SystemTimeSource),
//!     config: SyncDriverConfig::default(),
//! })?;
//! driver.start();
//! driver.ingest(block_from_peer);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// In-memory port implementations
pub mod adapters;
pub mod config;
pub mod deferred;
/// Domain models
pub mod domain;
pub mod error;
pub mod metrics;
pub mod mining;
/// Hexagonal architecture interfaces (inbound/outbound)
pub mod ports;
pub mod service;
pub mod timer;

pub use config::SyncDriverConfig;
pub use error::{Result, SyncDriverError};
pub use metrics::DriverMetrics;

pub use domain::{
    Block, BlockMetadata, DriverClock, DriverState, SyncStateStore, SyncStatus, TxPoolSnapshot,
    UNKNOWN_EPOCH_DIFF,
};

pub use ports::{ChainState, DriverStatus, MiningWorker, PeerNetwork, SyncDriverApi, TimeSource};

pub use service::{ConsensusDriver, DriverDependencies, LivenessVerdict};

/// Subsystem identifier used in log prefixes
pub const SUBSYSTEM_ID: u8 = 18;

/// Default seconds a block must age before it counts as fresh
pub const DEFAULT_MINIMUM_MINTING_DELAY: u64 = 45;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_id() {
        assert_eq!(SUBSYSTEM_ID, 18);
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_MINIMUM_MINTING_DELAY, 45);
        assert_eq!(UNKNOWN_EPOCH_DIFF, -1);
    }
}
