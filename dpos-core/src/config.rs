//! Staking parameters
//!
//! Parameters are fixed at genesis and stored inside the [`World`](crate::World)
//! snapshot, so every node derives the same transitions from the same state.

use crate::types::{Amount, Currency, NativeTokens};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Blocks per day at the reference block time
pub const BLOCKS_PER_DAY: i64 = 50_400;

/// Staking parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Lock period (blocks) for unbonding and redelegation entries
    ///
    /// An entry created at height `h` completes at `h + unbonding_period`:
    /// with the default period, an entry from height 1 is still live at
    /// `50_400 * 5` and is removed at `50_400 * 5 + 1`.
    pub unbonding_period: i64,

    /// Maximum simultaneous entries per undelegation
    pub max_undelegation_entries: usize,

    /// Maximum simultaneous entries per redelegation
    pub max_redelegation_entries: usize,

    /// Minimum operator self-delegation (ConsensusToken quantity)
    pub min_self_delegation: Decimal,

    /// Size of the active validator set
    pub max_validators: usize,

    /// Currencies whose rewards are distributed to delegators
    pub reward_currencies: NativeTokens,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            unbonding_period: BLOCKS_PER_DAY * 5,
            max_undelegation_entries: 10,
            max_redelegation_entries: 10,
            min_self_delegation: Decimal::ONE,
            max_validators: 100,
            reward_currencies: [Currency::GovernanceToken].into_iter().collect(),
        }
    }
}

impl Params {
    /// Minimum self-delegation as a ConsensusToken amount
    pub fn min_self_delegation(&self) -> Amount {
        Amount::new(Currency::ConsensusToken, self.min_self_delegation)
    }

    /// Validate parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.unbonding_period <= 0 {
            return Err(Error::Config("unbonding_period must be positive".to_string()));
        }

        if self.max_undelegation_entries == 0 || self.max_redelegation_entries == 0 {
            return Err(Error::Config("entry caps must be at least 1".to_string()));
        }

        if self.min_self_delegation < Decimal::ZERO {
            return Err(Error::Config(
                "min_self_delegation must not be negative".to_string(),
            ));
        }

        if self.max_validators == 0 {
            return Err(Error::Config("max_validators must be at least 1".to_string()));
        }

        if let Some(currency) = self
            .reward_currencies
            .iter()
            .find(|currency| !currency.is_transferable())
        {
            return Err(Error::Config(format!(
                "reward currency {} is not transferable",
                currency
            )));
        }

        Ok(())
    }
}
