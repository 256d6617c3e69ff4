//! Lazy reward distribution
//!
//! Each validator carries a cumulative reward-per-share index per reward
//! currency. Allocation only bumps the index and escrows the reward; a
//! delegation collects `share * (index - snapshot)` when it is settled. Any
//! change to a validator's share supply must be preceded by settling every
//! delegation bonded to it, which is what [`Settled`] witnesses.

use crate::control::{
    DelegateCtrl, ValidatorCtrl, ValidatorDelegationSetCtrl, ValidatorPowerIndexCtrl,
};
use crate::model::{reward_address, Delegation, RewardPool};
use crate::types::{ActionContext, Address, Amount, Currency};
use crate::world::WorldState;
use crate::{Error, Result};
use rust_decimal::Decimal;

/// Proof that every delegation bonded to a validator was settled at the
/// current reward index
///
/// Only [`DistributionCtrl::settle_validator_mut`] issues one, and the Share
/// mint and burn steps of [`Bond`](crate::control::Bond) consume it.
#[derive(Debug)]
#[must_use]
pub struct Settled {
    validator_address: Address,
    block_index: i64,
}

impl Settled {
    /// Validator whose delegations were settled
    pub fn validator_address(&self) -> &Address {
        &self.validator_address
    }

    /// Height the settlement ran at
    pub fn block_index(&self) -> i64 {
        self.block_index
    }

    /// Fail unless this proof covers `validator_address` at `ctx`'s height
    pub fn ensure_covers(&self, validator_address: &Address, ctx: &ActionContext) -> Result<()> {
        if self.validator_address != *validator_address || self.block_index != ctx.block_index {
            return Err(Error::InvariantViolation(format!(
                "settlement for {} at {} does not cover {} at {}",
                self.validator_address, self.block_index, validator_address, ctx.block_index
            )));
        }
        Ok(())
    }
}

/// Reward allocation, settlement and withdrawal
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionCtrl;

impl DistributionCtrl {
    /// Reward pool of a validator, or a fresh one
    pub fn get_pool<W: WorldState>(
        world: &W,
        validator_address: &Address,
        currency: Currency,
    ) -> Result<RewardPool> {
        Ok(world
            .get_record(&RewardPool::derive_address(validator_address, currency))?
            .unwrap_or_else(|| RewardPool::new(*validator_address, currency)))
    }

    /// Settle every delegation bonded to a validator
    pub fn settle_validator_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        validator_address: &Address,
    ) -> Result<Settled> {
        let set = ValidatorDelegationSetCtrl::fetch(world, validator_address)?;
        for delegation_address in &set.set {
            Self::settle_delegation_mut(world, ctx, delegation_address)?;
        }

        Ok(Settled {
            validator_address: *validator_address,
            block_index: ctx.block_index,
        })
    }

    /// Pay a delegation's pending rewards to its reward address
    ///
    /// Payouts are truncated to the reward currency and capped at what the
    /// validator's pool holds in escrow.
    pub fn settle_delegation_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        delegation_address: &Address,
    ) -> Result<()> {
        let mut delegation = DelegateCtrl::fetch_delegation(world, delegation_address)?;
        let share = DelegateCtrl::share(world, delegation_address);
        let recipient = reward_address(&delegation.delegator_address);

        let currencies = world.params().reward_currencies.clone();
        for currency in currencies {
            let pool = Self::get_pool(world, &delegation.validator_address, currency)?;
            let snapshot = delegation
                .reward_snapshots
                .get(&currency)
                .copied()
                .unwrap_or(pool.index);

            let pending = Amount::new(currency, pool.accrued(&share, snapshot)?);
            let escrow = world.get_balance(&pool.address(), currency);
            let payout = if pending > escrow { escrow } else { pending };

            if payout.is_positive() {
                world.transfer_asset(ctx, &pool.address(), &recipient, &payout)?;
                tracing::debug!(
                    delegation = %delegation_address,
                    reward = %payout,
                    "Reward settled"
                );
            }

            delegation.reward_snapshots.insert(currency, pool.index);
        }

        delegation.latest_distribute_height = ctx.block_index;
        world.set_record(delegation.address, &delegation)?;
        Ok(())
    }

    /// Snapshot the current index for a delegation without paying anything
    ///
    /// Used after a delegation's Share balance changed, once it was settled.
    pub fn stamp_delegation_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        delegation_address: &Address,
    ) -> Result<()> {
        let mut delegation = DelegateCtrl::fetch_delegation(world, delegation_address)?;

        let currencies = world.params().reward_currencies.clone();
        for currency in currencies {
            let pool = Self::get_pool(world, &delegation.validator_address, currency)?;
            delegation.reward_snapshots.insert(currency, pool.index);
        }

        delegation.latest_distribute_height = ctx.block_index;
        world.set_record(delegation.address, &delegation)
    }

    /// Open a new distribution period with `total_shares` as denominator
    pub fn start_new_mut<W: WorldState>(
        world: &mut W,
        validator_address: &Address,
        currency: Currency,
        total_shares: &Amount,
    ) -> Result<()> {
        total_shares.ensure_currency(Currency::Share)?;

        let mut pool = Self::get_pool(world, validator_address, currency)?;
        pool.period += 1;
        pool.total_shares = total_shares.quantity();
        world.set_record(pool.address(), &pool)
    }

    /// Allocate `reward` held at `source` to a validator's delegators
    pub fn allocate<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        validator_address: &Address,
        source: &Address,
        reward: &Amount,
    ) -> Result<W> {
        let mut world = world.clone();
        Self::allocate_mut(&mut world, ctx, validator_address, source, reward)?;
        Ok(world)
    }

    /// [`DistributionCtrl::allocate`] against a scratch snapshot
    pub fn allocate_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        validator_address: &Address,
        source: &Address,
        reward: &Amount,
    ) -> Result<()> {
        reward.ensure_positive()?;
        if !world.params().reward_currencies.contains(&reward.currency()) {
            return Err(Error::InvalidAmount(format!(
                "{} is not a reward currency",
                reward.currency()
            )));
        }
        ValidatorCtrl::fetch(world, validator_address)?;

        let mut pool = Self::get_pool(world, validator_address, reward.currency())?;
        if pool.total_shares.is_zero() {
            return Err(Error::NoDelegatorShares(*validator_address));
        }

        world.transfer_asset(ctx, source, &pool.address(), reward)?;

        let increment = reward
            .quantity()
            .checked_div(pool.total_shares)
            .ok_or_else(|| {
                Error::ArithmeticOverflow(format!("{} / {}", reward, pool.total_shares))
            })?;
        pool.index = pool
            .index
            .checked_add(increment)
            .ok_or_else(|| Error::ArithmeticOverflow(format!("{} + {}", pool.index, increment)))?;
        world.set_record(pool.address(), &pool)?;

        tracing::debug!(
            block_index = ctx.block_index,
            validator = %validator_address,
            reward = %reward,
            index = %pool.index,
            "Reward allocated"
        );

        Ok(())
    }

    /// Split every reward currency balance at `source` across the active
    /// validators in proportion to their power
    ///
    /// Truncation dust stays at `source`. Returns the allocations made.
    pub fn allocate_by_power<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        source: &Address,
    ) -> Result<(W, Vec<(Address, Amount)>)> {
        let mut world = world.clone();
        let allocations = Self::allocate_by_power_mut(&mut world, ctx, source)?;
        Ok((world, allocations))
    }

    /// [`DistributionCtrl::allocate_by_power`] against a scratch snapshot
    pub fn allocate_by_power_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        source: &Address,
    ) -> Result<Vec<(Address, Amount)>> {
        let max_validators = world.params().max_validators;
        let active = ValidatorPowerIndexCtrl::active_validators(world, max_validators)?;
        let total_power: Decimal = active.iter().map(|entry| entry.power).sum();
        if total_power.is_zero() {
            return Ok(Vec::new());
        }

        let mut allocations = Vec::new();
        let currencies = world.params().reward_currencies.clone();
        for currency in currencies {
            let available = world.get_balance(source, currency);
            if !available.is_positive() {
                continue;
            }

            for entry in &active {
                let reward = available.mul_div(entry.power, total_power, currency)?;
                if !reward.is_positive() {
                    continue;
                }
                Self::allocate_mut(world, ctx, &entry.validator_address, source, &reward)?;
                allocations.push((entry.validator_address, reward));
            }
        }

        Ok(allocations)
    }

    /// Settle a delegation and move everything at the delegator's reward
    /// address to the delegator
    pub fn withdraw<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        delegator_address: &Address,
        validator_address: &Address,
    ) -> Result<(W, Vec<Amount>)> {
        let mut world = world.clone();
        let withdrawn = Self::withdraw_mut(&mut world, ctx, delegator_address, validator_address)?;
        Ok((world, withdrawn))
    }

    /// [`DistributionCtrl::withdraw`] against a scratch snapshot
    pub fn withdraw_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        delegator_address: &Address,
        validator_address: &Address,
    ) -> Result<Vec<Amount>> {
        ValidatorCtrl::fetch(world, validator_address)?;
        let delegation_address = Delegation::derive_address(delegator_address, validator_address);
        Self::settle_delegation_mut(world, ctx, &delegation_address)?;

        let source = reward_address(delegator_address);
        let mut withdrawn = Vec::new();
        let currencies = world.params().reward_currencies.clone();
        for currency in currencies {
            let reward = world.get_balance(&source, currency);
            if reward.is_positive() {
                world.transfer_asset(ctx, &source, delegator_address, &reward)?;
                withdrawn.push(reward);
            }
        }

        tracing::info!(
            block_index = ctx.block_index,
            delegator = %delegator_address,
            validator = %validator_address,
            currencies = withdrawn.len(),
            "Rewards withdrawn"
        );

        Ok(withdrawn)
    }

    /// Rewards a delegation would collect if settled now
    pub fn pending_reward<W: WorldState>(
        world: &W,
        delegation_address: &Address,
    ) -> Result<Vec<Amount>> {
        let delegation = DelegateCtrl::fetch_delegation(world, delegation_address)?;
        let share = DelegateCtrl::share(world, delegation_address);

        world
            .params()
            .reward_currencies
            .iter()
            .map(|currency| {
                let pool = Self::get_pool(world, &delegation.validator_address, *currency)?;
                let snapshot = delegation
                    .reward_snapshots
                    .get(currency)
                    .copied()
                    .unwrap_or(pool.index);
                Ok(Amount::new(*currency, pool.accrued(&share, snapshot)?))
            })
            .collect()
    }
}
