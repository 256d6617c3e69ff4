//! Delegation ledger and liquid-to-bonded delegation

use crate::control::{Bond, ValidatorCtrl};
use crate::model::Delegation;
use crate::types::{reserved, ActionContext, Address, Amount, Currency};
use crate::world::WorldState;
use crate::{Error, Result};

/// Delegation records and the Delegate protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegateCtrl;

impl DelegateCtrl {
    /// Load a delegation if present
    pub fn get_delegation<W: WorldState>(
        world: &W,
        delegation_address: &Address,
    ) -> Result<Option<Delegation>> {
        world.get_record(delegation_address)
    }

    /// Load a delegation or fail with [`Error::NullDelegation`]
    pub fn fetch_delegation<W: WorldState>(
        world: &W,
        delegation_address: &Address,
    ) -> Result<Delegation> {
        Self::get_delegation(world, delegation_address)?
            .ok_or(Error::NullDelegation(*delegation_address))
    }

    /// Load the (delegator, validator) delegation, creating it if absent
    pub fn fetch_or_create_mut<W: WorldState>(
        world: &mut W,
        delegator_address: &Address,
        validator_address: &Address,
    ) -> Result<Delegation> {
        let address = Delegation::derive_address(delegator_address, validator_address);
        if let Some(delegation) = Self::get_delegation(world, &address)? {
            return Ok(delegation);
        }

        let delegation = Delegation::new(*delegator_address, *validator_address);
        world.set_record(delegation.address, &delegation)?;
        Ok(delegation)
    }

    /// Share balance of a delegation
    pub fn share<W: WorldState>(world: &W, delegation_address: &Address) -> Amount {
        world.get_balance(delegation_address, Currency::Share)
    }

    /// Bond liquid GovernanceToken to a validator
    ///
    /// The GovernanceToken moves into the unbonded pool and the same quantity
    /// of ConsensusToken is bonded. Returns the issued Share.
    pub fn execute<W: WorldState>(
        world: &W,
        ctx: &ActionContext,
        delegator_address: &Address,
        validator_address: &Address,
        governance_token: &Amount,
    ) -> Result<(W, Amount)> {
        let mut world = world.clone();
        let issued_share = Self::execute_mut(
            &mut world,
            ctx,
            delegator_address,
            validator_address,
            governance_token,
        )?;
        Ok((world, issued_share))
    }

    /// [`DelegateCtrl::execute`] against a scratch snapshot
    pub fn execute_mut<W: WorldState>(
        world: &mut W,
        ctx: &ActionContext,
        delegator_address: &Address,
        validator_address: &Address,
        governance_token: &Amount,
    ) -> Result<Amount> {
        governance_token.ensure_currency(Currency::GovernanceToken)?;
        governance_token.ensure_positive()?;
        ValidatorCtrl::fetch(world, validator_address)?;

        world.transfer_asset(
            ctx,
            delegator_address,
            &reserved::UNBONDED_POOL,
            governance_token,
        )?;

        let consensus_token = governance_token.convert(Currency::ConsensusToken);
        let delegation = Self::fetch_or_create_mut(world, delegator_address, validator_address)?;
        let issued_share = Bond::execute_mut(
            world,
            ctx,
            &consensus_token,
            validator_address,
            &delegation.address,
        )?;

        tracing::debug!(
            block_index = ctx.block_index,
            delegator = %delegator_address,
            validator = %validator_address,
            amount = %governance_token,
            issued_share = %issued_share,
            "Delegated"
        );

        Ok(issued_share)
    }
}
