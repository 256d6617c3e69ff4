//! Bond and Cancel: the Share mint/burn protocol
//!
//! Both directions settle every delegation at the validator first, then change
//! the exchange rate. The mutation halves take a [`Settled`] proof, so the
//! ordering cannot be skipped.

use crate::control::{
    DelegateCtrl, DistributionCtrl, Settled, ValidatorCtrl, ValidatorDelegationSetCtrl,
    ValidatorPowerIndexCtrl,
};
use crate::model::{Delegation, Validator};
use crate::types::{ActionContext, Address, Amount, Currency};
use crate::world::WorldState;
use crate::{Error, Result};

/// Bonding engine
#[derive(Debug, Clone, Copy, Default)]
pub struct Bond;

impl Bond {
    /// Bond `consensus_token` to a validator on behalf of a delegation
    ///
    /// Returns the Share issued to the delegation.
    pub fn execute<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        consensus_token: &Amount,
        validator_address: &Address,
        delegation_address: &Address,
    ) -> Result<(W, Amount)> {
        let mut world = world.clone();
        let issued_share = Self::execute_mut(
            &mut world,
            ctx,
            consensus_token,
            validator_address,
            delegation_address,
        )?;
        Ok((world, issued_share))
    }

    /// [`Bond::execute`] against a scratch snapshot
    pub fn execute_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        consensus_token: &Amount,
        validator_address: &Address,
        delegation_address: &Address,
    ) -> Result<Amount> {
        consensus_token.ensure_currency(Currency::ConsensusToken)?;
        consensus_token.ensure_positive()?;

        let validator = ValidatorCtrl::fetch(world, validator_address)?;
        let delegation = Self::bonded_delegation(world, &validator, delegation_address)?;

        let settled = DistributionCtrl::settle_validator_mut(world, ctx, validator_address)?;
        Self::mint_share(world, ctx, settled, validator, &delegation, consensus_token)
    }

    /// Unbond `share` from a validator on behalf of a delegation
    ///
    /// Returns the ConsensusToken released from the validator's pool. The
    /// caller decides where it goes.
    pub fn cancel<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        share: &Amount,
        validator_address: &Address,
        delegation_address: &Address,
    ) -> Result<(W, Amount)> {
        let mut world = world.clone();
        let unbonding = Self::cancel_mut(&mut world, ctx, share, validator_address, delegation_address)?;
        Ok((world, unbonding))
    }

    /// [`Bond::cancel`] against a scratch snapshot
    pub fn cancel_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        share: &Amount,
        validator_address: &Address,
        delegation_address: &Address,
    ) -> Result<Amount> {
        share.ensure_currency(Currency::Share)?;
        share.ensure_positive()?;

        let balance = DelegateCtrl::share(world, delegation_address);
        if *share > balance {
            return Err(Error::insufficient(
                share,
                &balance,
                format!("delegation {} has insufficient share", delegation_address),
            ));
        }

        let validator = ValidatorCtrl::fetch(world, validator_address)?;
        let delegation = Self::bonded_delegation(world, &validator, delegation_address)?;

        let settled = DistributionCtrl::settle_validator_mut(world, ctx, validator_address)?;
        Self::burn_share(world, ctx, settled, validator, &delegation, share)
    }

    fn bonded_delegation<W: WorldState>(
        world: &W,
        validator: &Validator,
        delegation_address: &Address,
    ) -> Result<Delegation> {
        let delegation = DelegateCtrl::fetch_delegation(world, delegation_address)?;
        if delegation.validator_address != validator.address {
            return Err(Error::InvariantViolation(format!(
                "delegation {} belongs to {}, not {}",
                delegation_address, delegation.validator_address, validator.address
            )));
        }
        Ok(delegation)
    }

    fn mint_share<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        settled: Settled,
        mut validator: Validator,
        delegation: &Delegation,
        consensus_token: &Amount,
    ) -> Result<Amount> {
        settled.ensure_covers(&validator.address, ctx)?;

        let issued_share =
            ValidatorCtrl::share_from_consensus_token(world, &validator, consensus_token)?;
        if !issued_share.is_positive() {
            return Err(Error::InvalidAmount(format!(
                "{} issues no share at {}",
                consensus_token, validator.address
            )));
        }

        world.mint_asset(ctx, &validator.address, consensus_token)?;
        world.mint_asset(ctx, &delegation.address, &issued_share)?;

        validator.delegator_shares = validator.delegator_shares.checked_add(&issued_share)?;
        world.set_record(validator.address, &validator)?;
        ValidatorPowerIndexCtrl::update_mut(world, &validator.address)?;
        ValidatorDelegationSetCtrl::add_mut(world, &validator.address, &delegation.address)?;

        Self::start_new_periods(world, &validator)?;
        DistributionCtrl::stamp_delegation_mut(world, ctx, &delegation.address)?;

        tracing::debug!(
            block_index = ctx.block_index,
            validator = %validator.address,
            delegation = %delegation.address,
            consensus_token = %consensus_token,
            issued_share = %issued_share,
            "Bonded"
        );

        Ok(issued_share)
    }

    fn burn_share<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        settled: Settled,
        mut validator: Validator,
        delegation: &Delegation,
        share: &Amount,
    ) -> Result<Amount> {
        settled.ensure_covers(&validator.address, ctx)?;

        world.burn_asset(ctx, &delegation.address, share)?;

        if delegation.delegator_address == validator.operator_address && !validator.jailed {
            let remaining = DelegateCtrl::share(world, &delegation.address);
            let remaining_value = if remaining.is_zero() {
                Amount::zero(Currency::ConsensusToken)
            } else {
                ValidatorCtrl::consensus_token_from_share(world, &validator, &remaining)?
            };

            if remaining_value < world.params().min_self_delegation() {
                validator.jailed = true;
                tracing::info!(
                    block_index = ctx.block_index,
                    validator = %validator.address,
                    self_delegation = %remaining_value,
                    "Validator jailed for insufficient self-delegation"
                );
            }
        }

        // Rate is read before delegator_shares shrinks. A full exit takes the
        // whole pool so no dust is stranded.
        let unbonding = if *share == validator.delegator_shares {
            world.get_balance(&validator.address, Currency::ConsensusToken)
        } else {
            ValidatorCtrl::consensus_token_from_share(world, &validator, share)?
        };
        if !unbonding.is_positive() {
            return Err(Error::InvalidAmount(format!(
                "{} releases no consensus token from {}",
                share, validator.address
            )));
        }

        validator.delegator_shares = validator.delegator_shares.checked_sub(share)?;
        world.burn_asset(ctx, &validator.address, &unbonding)?;
        world.set_record(validator.address, &validator)?;
        ValidatorPowerIndexCtrl::update_mut(world, &validator.address)?;
        ValidatorDelegationSetCtrl::remove_if_exhausted_mut(
            world,
            &validator.address,
            &delegation.address,
        )?;

        Self::start_new_periods(world, &validator)?;
        DistributionCtrl::stamp_delegation_mut(world, ctx, &delegation.address)?;

        tracing::debug!(
            block_index = ctx.block_index,
            validator = %validator.address,
            delegation = %delegation.address,
            share = %share,
            unbonding = %unbonding,
            "Unbonded"
        );

        Ok(unbonding)
    }

    fn start_new_periods<W: WorldState>(world: &mut W, validator: &Validator) -> Result<()> {
        let currencies = world.params().reward_currencies.clone();
        for currency in currencies {
            DistributionCtrl::start_new_mut(
                world,
                &validator.address,
                currency,
                &validator.delegator_shares,
            )?;
        }
        Ok(())
    }
}
