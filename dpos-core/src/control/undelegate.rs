//! Unbonding queue

use crate::control::{Bond, DelegateCtrl, UnbondingSetCtrl, ValidatorCtrl};
use crate::model::{Delegation, Undelegation, UndelegationEntry};
use crate::types::{reserved, ActionContext, Address, Amount, Currency};
use crate::world::WorldState;
use crate::{Error, Result};

/// Undelegate, cancel and complete
#[derive(Debug, Clone, Copy, Default)]
pub struct UndelegateCtrl;

impl UndelegateCtrl {
    /// Load an undelegation if present
    pub fn get_undelegation<W: WorldState>(
        world: &W,
        undelegation_address: &Address,
    ) -> Result<Option<Undelegation>> {
        world.get_record(undelegation_address)
    }

    /// Load an undelegation or fail with [`Error::NullUndelegation`]
    pub fn fetch_undelegation<W: WorldState>(
        world: &W,
        undelegation_address: &Address,
    ) -> Result<Undelegation> {
        Self::get_undelegation(world, undelegation_address)?
            .ok_or(Error::NullUndelegation(*undelegation_address))
    }

    /// Load an entry
    pub fn get_entry<W: WorldState>(
        world: &W,
        entry_address: &Address,
    ) -> Result<Option<UndelegationEntry>> {
        world.get_record(entry_address)
    }

    /// Live entries of an undelegation in index order
    pub fn entries<W: WorldState>(
        world: &W,
        undelegation: &Undelegation,
    ) -> Result<Vec<UndelegationEntry>> {
        undelegation
            .undelegation_entry_addresses
            .values()
            .map(|address| {
                Self::get_entry(world, address)?.ok_or_else(|| {
                    Error::InvariantViolation(format!(
                        "undelegation {} references missing entry {}",
                        undelegation.address, address
                    ))
                })
            })
            .collect()
    }

    /// ConsensusToken locked by an undelegation's entries
    pub fn locked_balance<W: WorldState>(world: &W, undelegation_address: &Address) -> Amount {
        world.get_balance(undelegation_address, Currency::ConsensusToken)
    }

    /// Unbond `share` and lock the released ConsensusToken for the
    /// unbonding period
    ///
    /// Fails with [`Error::InvalidAmount`] if the released ConsensusToken is
    /// finer than the smallest GovernanceToken unit.
    pub fn execute<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        delegator_address: &Address,
        validator_address: &Address,
        share: &Amount,
    ) -> Result<(W, UndelegationEntry)> {
        let mut world = world.clone();
        let entry = Self::execute_mut(&mut world, ctx, delegator_address, validator_address, share)?;
        Ok((world, entry))
    }

    /// [`UndelegateCtrl::execute`] against a scratch snapshot
    pub fn execute_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        delegator_address: &Address,
        validator_address: &Address,
        share: &Amount,
    ) -> Result<UndelegationEntry> {
        share.ensure_currency(Currency::Share)?;
        ValidatorCtrl::fetch(world, validator_address)?;

        let address = Undelegation::derive_address(delegator_address, validator_address);
        let mut undelegation = Self::get_undelegation(world, &address)?
            .unwrap_or_else(|| Undelegation::new(*delegator_address, *validator_address));

        let max_entries = world.params().max_undelegation_entries;
        if undelegation.is_full(max_entries) {
            return Err(Error::MaximumUndelegationEntries {
                address,
                max: max_entries,
            });
        }

        let delegation_address = Delegation::derive_address(delegator_address, validator_address);
        let unbonding = Bond::cancel_mut(world, ctx, share, validator_address, &delegation_address)?;
        ensure_payable(&unbonding)?;
        world.mint_asset(ctx, &undelegation.address, &unbonding)?;

        let entry = UndelegationEntry::new(
            undelegation.address,
            unbonding,
            undelegation.undelegation_entry_index,
            ctx.block_index,
            world.params().unbonding_period,
        )?;
        world.set_record(entry.address, &entry)?;
        undelegation.add_entry(&entry);
        world.set_record(undelegation.address, &undelegation)?;
        UnbondingSetCtrl::add_undelegation_mut(world, &undelegation.address)?;

        tracing::debug!(
            block_index = ctx.block_index,
            undelegation = %undelegation.address,
            index = entry.index,
            unbonding = %entry.unbonding_consensus_token,
            completion_block_height = entry.completion_block_height,
            "Undelegation entry created"
        );

        Ok(entry)
    }

    /// Re-bond `consensus_token` still locked in unmatured entries
    ///
    /// Entries are drawn newest first; a partially drawn entry keeps its
    /// completion height. Returns the Share issued by the re-bond.
    pub fn cancel<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        undelegation_address: &Address,
        consensus_token: &Amount,
    ) -> Result<(W, Amount)> {
        let mut world = world.clone();
        let issued_share = Self::cancel_mut(&mut world, ctx, undelegation_address, consensus_token)?;
        Ok((world, issued_share))
    }

    /// [`UndelegateCtrl::cancel`] against a scratch snapshot
    pub fn cancel_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        undelegation_address: &Address,
        consensus_token: &Amount,
    ) -> Result<Amount> {
        consensus_token.ensure_currency(Currency::ConsensusToken)?;
        consensus_token.ensure_positive()?;
        ensure_payable(consensus_token)?;

        let mut undelegation = Self::fetch_undelegation(world, undelegation_address)?;
        ValidatorCtrl::fetch(world, &undelegation.validator_address)?;

        let mut unmatured: Vec<UndelegationEntry> = Self::entries(world, &undelegation)?
            .into_iter()
            .filter(|entry| !entry.is_matured(ctx.block_index))
            .collect();
        unmatured.reverse();

        let mut cancellable = Amount::zero(Currency::ConsensusToken);
        for entry in &unmatured {
            cancellable = cancellable.checked_add(&entry.unbonding_consensus_token)?;
        }
        if *consensus_token > cancellable {
            return Err(Error::insufficient(
                consensus_token,
                &cancellable,
                format!("undelegation {} has insufficient unmatured entries", undelegation_address),
            ));
        }

        let mut remaining = consensus_token.clone();
        for mut entry in unmatured {
            if remaining.is_zero() {
                break;
            }

            if entry.unbonding_consensus_token <= remaining {
                remaining = remaining.checked_sub(&entry.unbonding_consensus_token)?;
                undelegation.undelegation_entry_addresses.remove(&entry.index);
                world.remove_state(&entry.address);
            } else {
                entry.unbonding_consensus_token =
                    entry.unbonding_consensus_token.checked_sub(&remaining)?;
                remaining = Amount::zero(Currency::ConsensusToken);
                world.set_record(entry.address, &entry)?;
            }
        }

        world.burn_asset(ctx, &undelegation.address, consensus_token)?;
        world.set_record(undelegation.address, &undelegation)?;
        if undelegation.undelegation_entry_addresses.is_empty() {
            UnbondingSetCtrl::remove_undelegation_mut(world, &undelegation.address)?;
        }

        let delegation = DelegateCtrl::fetch_or_create_mut(
            world,
            &undelegation.delegator_address,
            &undelegation.validator_address,
        )?;
        let issued_share = Bond::execute_mut(
            world,
            ctx,
            consensus_token,
            &undelegation.validator_address,
            &delegation.address,
        )?;

        tracing::debug!(
            block_index = ctx.block_index,
            undelegation = %undelegation.address,
            consensus_token = %consensus_token,
            issued_share = %issued_share,
            "Undelegation cancelled"
        );

        Ok(issued_share)
    }

    /// Release every matured entry to the delegator as GovernanceToken
    ///
    /// Unmatured entries are untouched; calling again before new maturities
    /// is a no-op. Returns the entries removed.
    pub fn complete<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        undelegation_address: &Address,
    ) -> Result<(W, Vec<UndelegationEntry>)> {
        let mut world = world.clone();
        let matured = Self::complete_mut(&mut world, ctx, undelegation_address)?;
        Ok((world, matured))
    }

    /// [`UndelegateCtrl::complete`] against a scratch snapshot
    pub fn complete_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        undelegation_address: &Address,
    ) -> Result<Vec<UndelegationEntry>> {
        let mut undelegation = Self::fetch_undelegation(world, undelegation_address)?;

        let matured: Vec<UndelegationEntry> = Self::entries(world, &undelegation)?
            .into_iter()
            .filter(|entry| entry.is_matured(ctx.block_index))
            .collect();
        if matured.is_empty() {
            return Ok(matured);
        }

        for entry in &matured {
            world.burn_asset(ctx, &undelegation.address, &entry.unbonding_consensus_token)?;

            let payout = entry
                .unbonding_consensus_token
                .convert(Currency::GovernanceToken);
            if payout.is_positive() {
                world.transfer_asset(
                    ctx,
                    &reserved::UNBONDED_POOL,
                    &undelegation.delegator_address,
                    &payout,
                )?;
            }

            undelegation.undelegation_entry_addresses.remove(&entry.index);
            world.remove_state(&entry.address);
        }

        world.set_record(undelegation.address, &undelegation)?;
        if undelegation.undelegation_entry_addresses.is_empty() {
            UnbondingSetCtrl::remove_undelegation_mut(world, &undelegation.address)?;
        }

        tracing::info!(
            block_index = ctx.block_index,
            undelegation = %undelegation.address,
            matured = matured.len(),
            remaining = undelegation.undelegation_entry_addresses.len(),
            "Undelegation entries completed"
        );

        Ok(matured)
    }
}

/// Locked ConsensusToken is paid out as GovernanceToken at completion, so
/// every locked or re-bonded amount must be a whole GovernanceToken unit
fn ensure_payable(consensus_token: &Amount) -> Result<()> {
    let payout = consensus_token.convert(Currency::GovernanceToken);
    if payout.convert(Currency::ConsensusToken) != *consensus_token {
        return Err(Error::InvalidAmount(format!(
            "{} is not payable in {} units",
            consensus_token,
            Currency::GovernanceToken
        )));
    }
    Ok(())
}
