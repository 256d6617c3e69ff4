//! Redelegation queue

use crate::control::{Bond, DelegateCtrl, UnbondingSetCtrl, ValidatorCtrl};
use crate::model::{Delegation, Redelegation, RedelegationEntry};
use crate::types::{ActionContext, Address, Amount, Currency};
use crate::world::WorldState;
use crate::{Error, Result};

/// Move bonded stake between validators
#[derive(Debug, Clone, Copy, Default)]
pub struct RedelegateCtrl;

impl RedelegateCtrl {
    /// Load a redelegation if present
    pub fn get_redelegation<W: WorldState>(
        world: &W,
        redelegation_address: &Address,
    ) -> Result<Option<Redelegation>> {
        world.get_record(redelegation_address)
    }

    /// Load a redelegation or fail with [`Error::NullRedelegation`]
    pub fn fetch_redelegation<W: WorldState>(
        world: &W,
        redelegation_address: &Address,
    ) -> Result<Redelegation> {
        Self::get_redelegation(world, redelegation_address)?
            .ok_or(Error::NullRedelegation(*redelegation_address))
    }

    /// Live entries of a redelegation in index order
    pub fn entries<W: WorldState>(
        world: &W,
        redelegation: &Redelegation,
    ) -> Result<Vec<RedelegationEntry>> {
        redelegation
            .redelegation_entry_addresses
            .values()
            .map(|address| {
                world
                    .get_record::<RedelegationEntry>(address)?
                    .ok_or_else(|| {
                        Error::InvariantViolation(format!(
                            "redelegation {} references missing entry {}",
                            redelegation.address, address
                        ))
                    })
            })
            .collect()
    }

    /// Unbond `share` from `src` and bond the released ConsensusToken to `dst`
    pub fn execute<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        delegator_address: &Address,
        src_validator_address: &Address,
        dst_validator_address: &Address,
        share: &Amount,
    ) -> Result<(W, RedelegationEntry)> {
        let mut world = world.clone();
        let entry = Self::execute_mut(
            &mut world,
            ctx,
            delegator_address,
            src_validator_address,
            dst_validator_address,
            share,
        )?;
        Ok((world, entry))
    }

    /// [`RedelegateCtrl::execute`] against a scratch snapshot
    pub fn execute_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        delegator_address: &Address,
        src_validator_address: &Address,
        dst_validator_address: &Address,
        share: &Amount,
    ) -> Result<RedelegationEntry> {
        ValidatorCtrl::fetch(world, src_validator_address)?;
        ValidatorCtrl::fetch(world, dst_validator_address)?;
        share.ensure_currency(Currency::Share)?;

        let src_delegation = Delegation::derive_address(delegator_address, src_validator_address);
        let balance = DelegateCtrl::share(world, &src_delegation);
        if *share > balance {
            return Err(Error::insufficient(
                share,
                &balance,
                format!("delegation {} has insufficient share", src_delegation),
            ));
        }

        if src_validator_address == dst_validator_address {
            return Err(Error::SelfRedelegation(*src_validator_address));
        }
        Self::ensure_unlocked(world, ctx, &src_delegation, share)?;

        let address = Redelegation::derive_address(
            delegator_address,
            src_validator_address,
            dst_validator_address,
        );
        let mut redelegation = Self::get_redelegation(world, &address)?.unwrap_or_else(|| {
            Redelegation::new(
                *delegator_address,
                *src_validator_address,
                *dst_validator_address,
            )
        });

        let max_entries = world.params().max_redelegation_entries;
        if redelegation.is_full(max_entries) {
            return Err(Error::MaximumRedelegationEntries {
                address,
                max: max_entries,
            });
        }

        let unbonding =
            Bond::cancel_mut(world, ctx, share, src_validator_address, &src_delegation)?;
        let dst_delegation =
            DelegateCtrl::fetch_or_create_mut(world, delegator_address, dst_validator_address)?;
        let issued_share = Bond::execute_mut(
            world,
            ctx,
            &unbonding,
            dst_validator_address,
            &dst_delegation.address,
        )?;

        let entry = RedelegationEntry::new(
            redelegation.address,
            share.clone(),
            unbonding,
            issued_share,
            redelegation.redelegation_entry_index,
            ctx.block_index,
            world.params().unbonding_period,
        )?;
        world.set_record(entry.address, &entry)?;
        redelegation.add_entry(&entry);
        world.set_record(redelegation.address, &redelegation)?;
        UnbondingSetCtrl::add_redelegation_mut(world, &redelegation.address)?;

        let mut dst_delegation = DelegateCtrl::fetch_delegation(world, &dst_delegation.address)?;
        if dst_delegation.incoming_redelegations.insert(redelegation.address) {
            world.set_record(dst_delegation.address, &dst_delegation)?;
        }

        tracing::debug!(
            block_index = ctx.block_index,
            redelegation = %redelegation.address,
            src = %src_validator_address,
            dst = %dst_validator_address,
            share = %entry.redelegating_share,
            issued_share = %entry.issued_share,
            completion_block_height = entry.completion_block_height,
            "Redelegation entry created"
        );

        Ok(entry)
    }

    /// Fail if `share` reaches into Share that arrived at the delegation by
    /// a redelegation still inside its lock period
    ///
    /// Share the delegator bonded directly stays free to move.
    pub fn ensure_unlocked<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        delegation_address: &Address,
        share: &Amount,
    ) -> Result<()> {
        let Some(delegation) = DelegateCtrl::get_delegation(world, delegation_address)? else {
            return Ok(());
        };
        let (locked, until) = Self::locked_share(world, ctx, &delegation)?;
        let Some(until) = until else {
            return Ok(());
        };

        let balance = DelegateCtrl::share(world, delegation_address);
        let free = if locked >= balance {
            Amount::zero(Currency::Share)
        } else {
            balance.checked_sub(&locked)?
        };
        if *share > free {
            return Err(Error::TransitiveRedelegation {
                validator: delegation.validator_address,
                until,
            });
        }
        Ok(())
    }

    /// Share issued to a delegation by unmatured incoming redelegations, and
    /// the height at which the last of them matures
    pub fn locked_share<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        delegation: &Delegation,
    ) -> Result<(Amount, Option<i64>)> {
        let mut locked = Amount::zero(Currency::Share);
        let mut until = None;

        for address in &delegation.incoming_redelegations {
            let redelegation = Self::fetch_redelegation(world, address)?;
            for entry in Self::entries(world, &redelegation)? {
                if entry.is_matured(ctx.block_index) {
                    continue;
                }
                locked = locked.checked_add(&entry.issued_share)?;
                until = until.max(Some(entry.completion_block_height));
            }
        }

        Ok((locked, until))
    }

    /// Drop matured entries; no tokens move
    pub fn complete<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        redelegation_address: &Address,
    ) -> Result<(W, Vec<RedelegationEntry>)> {
        let mut world = world.clone();
        let matured = Self::complete_mut(&mut world, ctx, redelegation_address)?;
        Ok((world, matured))
    }

    /// [`RedelegateCtrl::complete`] against a scratch snapshot
    pub fn complete_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        redelegation_address: &Address,
    ) -> Result<Vec<RedelegationEntry>> {
        let mut redelegation = Self::fetch_redelegation(world, redelegation_address)?;

        let matured: Vec<RedelegationEntry> = Self::entries(world, &redelegation)?
            .into_iter()
            .filter(|entry| entry.is_matured(ctx.block_index))
            .collect();
        if matured.is_empty() {
            return Ok(matured);
        }

        for entry in &matured {
            redelegation.redelegation_entry_addresses.remove(&entry.index);
            world.remove_state(&entry.address);
        }

        world.set_record(redelegation.address, &redelegation)?;
        if redelegation.redelegation_entry_addresses.is_empty() {
            UnbondingSetCtrl::remove_redelegation_mut(world, &redelegation.address)?;
            Self::unlink_mut(world, &redelegation)?;
        }

        tracing::info!(
            block_index = ctx.block_index,
            redelegation = %redelegation.address,
            matured = matured.len(),
            remaining = redelegation.redelegation_entry_addresses.len(),
            "Redelegation entries completed"
        );

        Ok(matured)
    }

    fn unlink_mut<W: WorldState>(world: &mut W, redelegation: &Redelegation) -> Result<()> {
        let delegation_address = Delegation::derive_address(
            &redelegation.delegator_address,
            &redelegation.dst_validator_address,
        );
        if let Some(mut delegation) = DelegateCtrl::get_delegation(world, &delegation_address)? {
            if delegation.incoming_redelegations.remove(&redelegation.address) {
                world.set_record(delegation.address, &delegation)?;
            }
        }
        Ok(())
    }
}
