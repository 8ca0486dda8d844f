//! Configuration types for the sync driver

use crate::error::{Result, SyncDriverError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the sync driver.
///
/// All `_secs` fields are whole seconds. Missing fields fall back to
/// [`SyncDriverConfig::default`].
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncDriverConfig {
    /// Whether this node mines at all.
    pub mining_enabled: bool,

    /// A block older than this (relative to trusted time) counts as proof
    /// the node has caught up.
    pub minimum_minting_delay_secs: u64,

    /// Watchdog rearm period.
    pub watchdog_period_secs: u64,

    /// Delay before the first watchdog tick after `start()`.
    pub watchdog_initial_delay_secs: u64,

    /// Mining-cycle age after which the watchdog treats PoW as stalled.
    pub pow_stall_secs: u64,

    /// Minimum time spent unsynced before the watchdog forces `Synced`.
    pub unsynced_grace_secs: u64,

    /// Maximum time in `Syncing` before the watchdog falls back to `Unsynced`.
    pub syncing_timeout_secs: u64,

    /// Delay from `start()` to the bootstrap task.
    pub bootstrap_delay_secs: u64,

    /// Delay from the bootstrap task to the cold-start `Synced` transition.
    pub bootstrap_settle_secs: u64,

    /// Delay between probing peers and the download trigger.
    pub download_delay_secs: u64,
}

impl Default for SyncDriverConfig {
    fn default() -> Self {
        Self {
            mining_enabled: true,
            minimum_minting_delay_secs: crate::DEFAULT_MINIMUM_MINTING_DELAY,
            watchdog_period_secs: 60,
            watchdog_initial_delay_secs: 80,
            pow_stall_secs: 90,
            unsynced_grace_secs: 120,
            syncing_timeout_secs: 60,
            bootstrap_delay_secs: 20,
            bootstrap_settle_secs: 30,
            download_delay_secs: 20,
        }
    }
}

impl SyncDriverConfig {
    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncDriverError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| SyncDriverError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would spin the watchdog.
    pub fn validate(&self) -> Result<()> {
        if self.watchdog_period_secs == 0 {
            return Err(SyncDriverError::InvalidConfig(
                "watchdog_period_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Watchdog rearm period.
    pub fn watchdog_period(&self) -> Duration {
        Duration::from_secs(self.watchdog_period_secs)
    }

    /// First watchdog delay.
    pub fn watchdog_initial_delay(&self) -> Duration {
        Duration::from_secs(self.watchdog_initial_delay_secs)
    }

    /// Delay before the bootstrap task.
    pub fn bootstrap_delay(&self) -> Duration {
        Duration::from_secs(self.bootstrap_delay_secs)
    }

    /// Delay from bootstrap to the cold-start transition.
    pub fn bootstrap_settle(&self) -> Duration {
        Duration::from_secs(self.bootstrap_settle_secs)
    }

    /// Delay before the download trigger.
    pub fn download_delay(&self) -> Duration {
        Duration::from_secs(self.download_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncDriverConfig::default();
        assert!(config.mining_enabled);
        assert_eq!(config.watchdog_period_secs, 60);
        assert_eq!(config.watchdog_initial_delay_secs, 80);
        assert_eq!(config.pow_stall_secs, 90);
        assert_eq!(config.unsynced_grace_secs, 120);
        assert_eq!(config.syncing_timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SyncDriverConfig =
            serde_json::from_str(r#"{"mining_enabled": false, "pow_stall_secs": 10}"#).unwrap();
        assert!(!config.mining_enabled);
        assert_eq!(config.pow_stall_secs, 10);
        assert_eq!(config.download_delay_secs, 20);
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = SyncDriverConfig {
            watchdog_period_secs: 0,
            ..SyncDriverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SyncDriverError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = SyncDriverConfig::from_json_file(Path::new("/nonexistent/qc-18.json"))
            .unwrap_err();
        assert!(matches!(err, SyncDriverError::InvalidConfig(_)));
    }
}
