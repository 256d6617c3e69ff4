//! Block-by-block staking engine

use crate::{Config, Error, Metrics, Result, Storage};
use dpos_core::{
    control::{DistributionCtrl, MaturedEntries, UnbondingSetCtrl, ValidatorPowerIndexCtrl},
    reserved, Action, ActionContext, Address, Amount, Currency, World, WorldState,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::time::Instant;

/// One line of a replay log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayEntry {
    /// Signed staking action
    Action {
        /// Signer
        signer: Address,
        /// Action payload
        action: Action,
    },

    /// Close the current block
    EndBlock,
}

/// Outcome of one committed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    /// Committed height
    pub height: i64,

    /// Actions applied in the block
    pub applied: usize,

    /// Actions rejected in the block
    pub failed: usize,

    /// Reward allocations made at end of block
    pub allocations: usize,

    /// Queue entries completed at end of block
    pub matured: MaturedEntries,
}

/// Outcome of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Blocks committed
    pub blocks: usize,

    /// Actions applied
    pub applied: usize,

    /// Actions rejected
    pub failed: usize,
}

/// Single writer over the committed staking snapshot
#[derive(Debug)]
pub struct StakingEngine {
    world: World,
    height: i64,
    block_reward: Amount,
    applied: usize,
    failed: usize,
    storage: Storage,
    metrics: Metrics,
}

impl StakingEngine {
    /// Open storage, restoring the last committed block or writing genesis
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let storage = Storage::open(config)?;
        let metrics = Metrics::new()?;

        let (world, committed) = match storage.load()? {
            Some(loaded) => loaded,
            None => {
                let world = config.genesis_world()?;
                storage.commit(&world, 0)?;
                tracing::info!(allocations = config.genesis.len(), "Genesis committed");
                (world, 0)
            }
        };

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            height = committed,
            "Staking engine opened"
        );

        Ok(Self {
            world,
            height: committed + 1,
            block_reward: Amount::new(Currency::GovernanceToken, config.block_reward),
            applied: 0,
            failed: 0,
            storage,
            metrics,
        })
    }

    /// Working snapshot of the block being built
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Height of the block being built
    pub fn height(&self) -> i64 {
        self.height
    }

    /// Metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Apply an action to the working snapshot
    ///
    /// A rejected action leaves the working snapshot unchanged.
    pub fn apply(&mut self, signer: Address, action: &Action) -> Result<()> {
        let ctx = ActionContext::new(signer, self.height);

        match action.execute(&self.world, &ctx) {
            Ok(next) => {
                self.world = next;
                self.applied += 1;
                self.metrics.record_action_applied(action.type_id());
                Ok(())
            }
            Err(e) => {
                self.failed += 1;
                self.metrics.record_action_failed(action.type_id());
                tracing::warn!(
                    height = self.height,
                    signer = %signer,
                    type_id = action.type_id(),
                    error = %e,
                    "Action rejected"
                );
                Err(e.into())
            }
        }
    }

    /// Mint the block reward, allocate the reward pool by power, complete
    /// matured queue entries and persist the block
    pub fn end_block(&mut self) -> Result<BlockSummary> {
        let started = Instant::now();
        let ctx = ActionContext::new(reserved::REWARD_POOL, self.height);
        let mut world = self.world.clone();

        if self.block_reward.is_positive() {
            world.mint_asset(&ctx, &reserved::REWARD_POOL, &self.block_reward)?;
        }
        let allocations =
            DistributionCtrl::allocate_by_power_mut(&mut world, &ctx, &reserved::REWARD_POOL)?;
        let matured = UnbondingSetCtrl::complete_mut(&mut world, &ctx)?;

        self.storage.commit(&world, self.height)?;
        self.world = world;

        let summary = BlockSummary {
            height: self.height,
            applied: self.applied,
            failed: self.failed,
            allocations: allocations.len(),
            matured,
        };

        self.metrics
            .record_block_committed(matured.total(), started.elapsed().as_secs_f64());
        self.update_validator_gauges()?;

        tracing::info!(
            height = summary.height,
            applied = summary.applied,
            failed = summary.failed,
            allocations = summary.allocations,
            matured = matured.total(),
            "Block committed"
        );

        self.height += 1;
        self.applied = 0;
        self.failed = 0;
        Ok(summary)
    }

    /// Apply a JSON-lines log, committing a block at every `end_block` entry
    /// and at end of input
    ///
    /// Rejected actions are counted and skipped; malformed lines abort.
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: ReplayEntry =
                serde_json::from_str(&line).map_err(|e| Error::InvalidInput {
                    line: index + 1,
                    message: e.to_string(),
                })?;

            match entry {
                ReplayEntry::Action { signer, action } => match self.apply(signer, &action) {
                    Ok(()) => summary.applied += 1,
                    Err(Error::Staking(_)) => summary.failed += 1,
                    Err(e) => return Err(e),
                },
                ReplayEntry::EndBlock => {
                    self.end_block()?;
                    summary.blocks += 1;
                }
            }
        }

        if self.applied + self.failed > 0 {
            self.end_block()?;
            summary.blocks += 1;
        }

        Ok(summary)
    }

    fn update_validator_gauges(&self) -> Result<()> {
        let active = ValidatorPowerIndexCtrl::active_validators(
            &self.world,
            self.world.params().max_validators,
        )?;
        let bonded: Decimal = active.iter().map(|entry| entry.power).sum();
        self.metrics
            .update_validator_set(active.len(), bonded.to_f64().unwrap_or(f64::MAX));
        Ok(())
    }
}
