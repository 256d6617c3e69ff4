//! Validator registry

use crate::control::{DelegateCtrl, ValidatorPowerIndexCtrl};
use crate::crypto::PublicKey;
use crate::model::{Delegation, Validator};
use crate::types::{ActionContext, Address, Amount, Currency};
use crate::world::WorldState;
use crate::{Error, Result};

/// Validator lifecycle and Share/ConsensusToken exchange rate
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorCtrl;

impl ValidatorCtrl {
    /// Load a validator if present
    pub fn get<W: WorldState>(world: &W, validator_address: &Address) -> Result<Option<Validator>> {
        world.get_record(validator_address)
    }

    /// Load a validator or fail with [`Error::NullValidator`]
    pub fn fetch<W: WorldState>(world: &W, validator_address: &Address) -> Result<Validator> {
        Self::get(world, validator_address)?.ok_or(Error::NullValidator(*validator_address))
    }

    /// Register a validator for `operator_address` and self-delegate
    ///
    /// `self_delegation` must be GovernanceToken, at least the minimum
    /// self-delegation and covered by the operator's liquid balance.
    pub fn create<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        operator_address: Address,
        operator_public_key: PublicKey,
        self_delegation: &Amount,
    ) -> Result<(W, Validator)> {
        let mut world = world.clone();
        let validator = Self::create_mut(
            &mut world,
            ctx,
            operator_address,
            operator_public_key,
            self_delegation,
        )?;
        Ok((world, validator))
    }

    /// [`ValidatorCtrl::create`] against a scratch snapshot
    pub fn create_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        operator_address: Address,
        operator_public_key: PublicKey,
        self_delegation: &Amount,
    ) -> Result<Validator> {
        self_delegation.ensure_currency(Currency::GovernanceToken)?;

        let minimum = world
            .params()
            .min_self_delegation()
            .convert(Currency::GovernanceToken);
        if *self_delegation < minimum || !self_delegation.is_positive() {
            return Err(Error::insufficient(
                &minimum,
                self_delegation,
                format!("self-delegation of {} is below the minimum", operator_address),
            ));
        }

        let balance = world.get_balance(&operator_address, Currency::GovernanceToken);
        if *self_delegation > balance {
            return Err(Error::insufficient(
                self_delegation,
                &balance,
                format!("operator {} cannot cover self-delegation", operator_address),
            ));
        }

        let validator_address = Validator::derive_address(&operator_address);
        if Self::get(world, &validator_address)?.is_some() {
            return Err(Error::DuplicateValidator(validator_address));
        }

        let validator = Validator::new(operator_address, operator_public_key);
        world.set_record(validator.address, &validator)?;
        ValidatorPowerIndexCtrl::update_mut(world, &validator.address)?;

        DelegateCtrl::execute_mut(
            world,
            ctx,
            &operator_address,
            &validator_address,
            self_delegation,
        )?;

        tracing::info!(
            block_index = ctx.block_index,
            validator = %validator_address,
            operator = %operator_address,
            self_delegation = %self_delegation,
            "Validator created"
        );

        Self::fetch(world, &validator_address)
    }

    /// Jail a validator and drop it from the power index
    pub fn jail<W: WorldState>(world: &W, validator_address: &Address) -> Result<W> {
        let mut world = world.clone();
        Self::jail_mut(&mut world, validator_address)?;
        Ok(world)
    }

    /// [`ValidatorCtrl::jail`] against a scratch snapshot
    pub fn jail_mut<W: WorldState>(world: &mut W, validator_address: &Address) -> Result<()> {
        let mut validator = Self::fetch(world, validator_address)?;
        if validator.jailed {
            return Err(Error::JailedValidator {
                address: *validator_address,
                jailed: true,
            });
        }

        validator.jailed = true;
        world.set_record(validator.address, &validator)?;
        ValidatorPowerIndexCtrl::update_mut(world, validator_address)?;

        tracing::info!(validator = %validator_address, "Validator jailed");
        Ok(())
    }

    /// Clear the jailed flag and re-rank the validator at its current power
    pub fn unjail<W: WorldState>(world: &W, validator_address: &Address) -> Result<W> {
        let mut world = world.clone();
        Self::unjail_mut(&mut world, validator_address)?;
        Ok(world)
    }

    /// [`ValidatorCtrl::unjail`] against a scratch snapshot
    pub fn unjail_mut<W: WorldState>(world: &mut W, validator_address: &Address) -> Result<()> {
        let mut validator = Self::fetch(world, validator_address)?;
        if !validator.jailed {
            return Err(Error::JailedValidator {
                address: *validator_address,
                jailed: false,
            });
        }

        validator.jailed = false;
        world.set_record(validator.address, &validator)?;
        ValidatorPowerIndexCtrl::update_mut(world, validator_address)?;

        tracing::info!(validator = %validator_address, "Validator unjailed");
        Ok(())
    }

    /// ConsensusToken value of the operator's own delegation
    pub fn self_delegation<W: WorldState>(world: &W, validator: &Validator) -> Result<Amount> {
        let delegation_address =
            Delegation::derive_address(&validator.operator_address, &validator.address);
        let share = world.get_balance(&delegation_address, Currency::Share);
        if share.is_zero() {
            return Ok(Amount::zero(Currency::ConsensusToken));
        }
        Self::consensus_token_from_share(world, validator, &share)
    }

    /// Share issued for bonding `consensus_token` at the current rate
    ///
    /// A validator without shares issues at 1:1.
    pub fn share_from_consensus_token<W: WorldState>(
        world: &W,
        validator: &Validator,
        consensus_token: &Amount,
    ) -> Result<Amount> {
        consensus_token.ensure_currency(Currency::ConsensusToken)?;
        if validator.delegator_shares.is_zero() {
            return Ok(consensus_token.convert(Currency::Share));
        }

        let bonded = world.get_balance(&validator.address, Currency::ConsensusToken);
        if bonded.is_zero() {
            return Err(Error::InvalidExchangeRate(validator.address));
        }

        consensus_token.mul_div(
            validator.delegator_shares.quantity(),
            bonded.quantity(),
            Currency::Share,
        )
    }

    /// ConsensusToken backing `share` at the current rate
    pub fn consensus_token_from_share<W: WorldState>(
        world: &W,
        validator: &Validator,
        share: &Amount,
    ) -> Result<Amount> {
        share.ensure_currency(Currency::Share)?;
        if validator.delegator_shares.is_zero() {
            return Err(Error::InvalidExchangeRate(validator.address));
        }

        let bonded = world.get_balance(&validator.address, Currency::ConsensusToken);
        share.mul_div(
            bonded.quantity(),
            validator.delegator_shares.quantity(),
            Currency::ConsensusToken,
        )
    }
}
