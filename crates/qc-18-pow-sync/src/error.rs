//! Error types for the sync driver subsystem

use primitive_types::H256;
use thiserror::Error;

/// Result type alias for sync driver operations
pub type Result<T> = std::result::Result<T, SyncDriverError>;

/// Errors surfaced by the sync driver.
///
/// None of these abort the driver. Timer callbacks and the ingest path log
/// them and carry on at the next scheduled tick.
#[derive(Debug, Error)]
pub enum SyncDriverError {
    /// Chain state has no metadata for the parent we want to mine on
    #[error("Missing block metadata for {0:?}")]
    MissingMetadata(H256),

    /// Peer network call failed
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Driver constructed outside a tokio runtime
    #[error("No tokio runtime available to schedule timers")]
    NoRuntime,
}

impl SyncDriverError {
    /// Check if the next scheduled tick can be expected to clear the error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingMetadata(_) | Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        assert!(SyncDriverError::Network("timeout".into()).is_recoverable());
        assert!(SyncDriverError::MissingMetadata(H256::zero()).is_recoverable());
        assert!(!SyncDriverError::InvalidConfig("x".into()).is_recoverable());
        assert!(!SyncDriverError::NoRuntime.is_recoverable());
    }
}
