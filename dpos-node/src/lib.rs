//! DPoS Staking Node
//!
//! Block-by-block orchestration around [`dpos_core`]: applies staking actions
//! against the committed snapshot, runs the end-block reward allocation and
//! maturity sweep, and persists each block's snapshot to RocksDB.
//!
//! # Architecture
//!
//! - **Single writer**: one [`StakingEngine`] owns the committed snapshot
//! - **Atomic commit**: a block's snapshot is written in one `WriteBatch`
//! - **Replay**: the `dpos-node` binary feeds a JSON-lines action log

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod storage;

// Re-exports
pub use config::Config;
pub use engine::{BlockSummary, ReplayEntry, ReplaySummary, StakingEngine};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use storage::Storage;
