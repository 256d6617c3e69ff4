//! Per-validator delegation sets

use crate::model::ValidatorDelegationSet;
use crate::types::{Address, Currency};
use crate::world::WorldState;
use crate::Result;

/// Tracks which delegations hold Share at a validator
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorDelegationSetCtrl;

impl ValidatorDelegationSetCtrl {
    /// Load the set, or an empty one
    pub fn fetch<W: WorldState>(
        world: &W,
        validator_address: &Address,
    ) -> Result<ValidatorDelegationSet> {
        Ok(world
            .get_record(&ValidatorDelegationSet::derive_address(validator_address))?
            .unwrap_or_else(|| ValidatorDelegationSet::new(*validator_address)))
    }

    /// Add a delegation
    pub fn add_mut<W: WorldState>(
        world: &mut W,
        validator_address: &Address,
        delegation_address: &Address,
    ) -> Result<()> {
        let mut set = Self::fetch(world, validator_address)?;
        if set.set.insert(*delegation_address) {
            world.set_record(set.address(), &set)?;
        }
        Ok(())
    }

    /// Remove a delegation once its Share balance is exhausted
    pub fn remove_if_exhausted_mut<W: WorldState>(
        world: &mut W,
        validator_address: &Address,
        delegation_address: &Address,
    ) -> Result<()> {
        if world
            .get_balance(delegation_address, Currency::Share)
            .is_positive()
        {
            return Ok(());
        }

        let mut set = Self::fetch(world, validator_address)?;
        if set.set.remove(delegation_address) {
            world.set_record(set.address(), &set)?;
        }
        Ok(())
    }
}
