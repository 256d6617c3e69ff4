//! Validator power index maintenance

use crate::control::ValidatorCtrl;
use crate::model::{ValidatorPower, ValidatorPowerIndex};
use crate::types::{Address, Currency};
use crate::world::WorldState;
use crate::Result;

/// Keeps the ranked validator set in step with bonded balances
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorPowerIndexCtrl;

impl ValidatorPowerIndexCtrl {
    /// Current index (empty before the first validator)
    pub fn get<W: WorldState>(world: &W) -> Result<ValidatorPowerIndex> {
        Ok(world
            .get_record(&ValidatorPowerIndex::address())?
            .unwrap_or_default())
    }

    /// Re-rank one validator from its current ConsensusToken balance
    ///
    /// Jailed validators and validators without bonded power are removed.
    pub fn update_mut<W: WorldState>(world: &mut W, validator_address: &Address) -> Result<()> {
        let validator = ValidatorCtrl::fetch(world, validator_address)?;
        let power = world.get_balance(validator_address, Currency::ConsensusToken);

        let mut index = Self::get(world)?;
        if validator.jailed || power.is_zero() {
            index.remove(validator_address);
        } else {
            index.upsert(ValidatorPower::new(*validator_address, &power));
        }
        world.set_record(ValidatorPowerIndex::address(), &index)?;

        tracing::debug!(
            validator = %validator_address,
            power = %power,
            jailed = validator.jailed,
            "Power index updated"
        );

        Ok(())
    }

    /// Top `n` validators by power
    pub fn active_validators<W: WorldState>(world: &W, n: usize) -> Result<Vec<ValidatorPower>> {
        Ok(Self::get(world)?.top(n).cloned().collect())
    }
}
