//! Configuration for the staking node

use crate::{Error, Result};
use dpos_core::{ActionContext, Address, Amount, Params, World, WorldState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// GovernanceToken minted to the reward pool at the end of every block
    pub block_reward: Decimal,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Staking parameters written at genesis
    pub params: Params,

    /// Balances minted at genesis
    pub genesis: Vec<GenesisAllocation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/dpos"),
            service_name: "dpos-node".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            block_reward: Decimal::ZERO,
            rocksdb: RocksDBConfig::default(),
            params: Params::default(),
            genesis: Vec::new(),
        }
    }
}

/// Genesis balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    /// Recipient
    pub address: Address,

    /// Minted amount
    pub amount: Amount,
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 2,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("DPOS_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        Ok(config)
    }

    /// Validate staking parameters and the block reward
    pub fn validate(&self) -> Result<()> {
        self.params
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;

        if self.block_reward < Decimal::ZERO {
            return Err(Error::Config("block_reward must not be negative".to_string()));
        }

        Ok(())
    }

    /// Build the genesis snapshot
    pub fn genesis_world(&self) -> Result<World> {
        let mut world = World::new(self.params.clone())?;
        let ctx = ActionContext::new(Address::default(), 0);
        for allocation in &self.genesis {
            world.mint_asset(&ctx, &allocation.address, &allocation.amount)?;
        }
        Ok(world)
    }
}
