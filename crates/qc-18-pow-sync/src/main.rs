//! # PoW Sync Driver - demo node
//!
//! Runs the sync driver against in-memory adapters: a single-genesis chain,
//! a recording miner, and a fixed peer list. A background task plays the
//! role of the network and delivers a new block every few seconds.
//!
//! ## Configuration
//!
//! - `QC_SYNC_CONFIG`: optional path to a JSON `SyncDriverConfig`
//! - `RUST_LOG`: log filter (default `info`)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use primitive_types::{H256, U256};
use tracing::info;
use tracing_subscriber::EnvFilter;

use qc_18_pow_sync::adapters::{InMemoryChain, InMemoryMiner, InMemoryNetwork, SystemTimeSource};
use qc_18_pow_sync::{
    Block, ChainState, ConsensusDriver, DriverDependencies, SyncDriverApi, SyncDriverConfig,
    TimeSource,
};

const DEMO_PEERS: [&str; 3] = ["10.0.0.11:9000", "10.0.0.12:9000", "10.0.0.13:9000"];
const DEMO_BLOCK_INTERVAL: Duration = Duration::from_secs(15);

fn load_config() -> Result<SyncDriverConfig> {
    match std::env::var_os("QC_SYNC_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            let config = SyncDriverConfig::from_json_file(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(SyncDriverConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = load_config()?;
    let time = Arc::new(SystemTimeSource);

    let genesis = Block::new(H256::zero(), 0, time.now());
    let chain = Arc::new(InMemoryChain::new(genesis, U256::from(1_000_000u64)));
    let network = Arc::new(InMemoryNetwork::with_peers(DEMO_PEERS));

    let driver = ConsensusDriver::new(DriverDependencies {
        chain: Arc::clone(&chain),
        miner: Arc::new(InMemoryMiner::new()),
        network,
        clock: time.clone(),
        trusted_time: time.clone(),
        config,
    })?;
    driver.start();

    let feeder = {
        let driver = Arc::clone(&driver);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(DEMO_BLOCK_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let block = chain.next_block(time.now());
                driver.ingest(block);
                let snapshot = serde_json::to_string(&driver.snapshot())
                    .unwrap_or_else(|e| format!("<unserializable: {}>", e));
                info!("height={} status={}", chain.height(), snapshot);
            }
        })
    };

    info!("Sync driver is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    feeder.abort();
    driver.shutdown();

    Ok(())
}
