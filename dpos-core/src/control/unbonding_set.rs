//! End-block maturity sweep

use crate::control::{RedelegateCtrl, UndelegateCtrl};
use crate::model::UnbondingSet;
use crate::types::{ActionContext, Address};
use crate::world::WorldState;
use crate::Result;

/// Entry counts removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaturedEntries {
    /// Undelegation entries paid out
    pub undelegation_entries: usize,

    /// Redelegation entries released
    pub redelegation_entries: usize,
}

impl MaturedEntries {
    /// Total entries removed
    pub fn total(&self) -> usize {
        self.undelegation_entries + self.redelegation_entries
    }
}

/// Maintains the unbonding set and completes matured queues
#[derive(Debug, Clone, Copy, Default)]
pub struct UnbondingSetCtrl;

impl UnbondingSetCtrl {
    /// Current set (empty if never written)
    pub fn get<W: WorldState>(world: &W) -> Result<UnbondingSet> {
        Ok(world.get_record(&UnbondingSet::address())?.unwrap_or_default())
    }

    /// Track an undelegation
    pub fn add_undelegation_mut<W: WorldState>(world: &mut W, address: &Address) -> Result<()> {
        let mut set = Self::get(world)?;
        if set.undelegation_addresses.insert(*address) {
            world.set_record(UnbondingSet::address(), &set)?;
        }
        Ok(())
    }

    /// Track a redelegation
    pub fn add_redelegation_mut<W: WorldState>(world: &mut W, address: &Address) -> Result<()> {
        let mut set = Self::get(world)?;
        if set.redelegation_addresses.insert(*address) {
            world.set_record(UnbondingSet::address(), &set)?;
        }
        Ok(())
    }

    /// Stop tracking an undelegation
    pub fn remove_undelegation_mut<W: WorldState>(world: &mut W, address: &Address) -> Result<()> {
        let mut set = Self::get(world)?;
        if set.undelegation_addresses.remove(address) {
            world.set_record(UnbondingSet::address(), &set)?;
        }
        Ok(())
    }

    /// Stop tracking a redelegation
    pub fn remove_redelegation_mut<W: WorldState>(world: &mut W, address: &Address) -> Result<()> {
        let mut set = Self::get(world)?;
        if set.redelegation_addresses.remove(address) {
            world.set_record(UnbondingSet::address(), &set)?;
        }
        Ok(())
    }

    /// Complete every tracked undelegation and redelegation
    pub fn complete<W: WorldState>(world: &W, ctx: &ActionContext) -> Result<(W, MaturedEntries)> {
        let mut world = world.clone();
        let matured = Self::complete_mut(&mut world, ctx)?;
        Ok((world, matured))
    }

    /// [`UnbondingSetCtrl::complete`] against a scratch snapshot
    pub fn complete_mut<W: WorldState>(world: &mut W, ctx: &ActionContext) -> Result<MaturedEntries> {
        let set = Self::get(world)?;
        let mut matured = MaturedEntries::default();

        for address in &set.undelegation_addresses {
            matured.undelegation_entries += UndelegateCtrl::complete_mut(world, ctx, address)?.len();
        }
        for address in &set.redelegation_addresses {
            matured.redelegation_entries += RedelegateCtrl::complete_mut(world, ctx, address)?.len();
        }

        if matured.total() > 0 {
            tracing::info!(
                block_index = ctx.block_index,
                undelegation_entries = matured.undelegation_entries,
                redelegation_entries = matured.redelegation_entries,
                "Unbonding set swept"
            );
        }

        Ok(matured)
    }
}
