//! Lazy reward distribution records

use crate::types::{Address, Amount, Currency};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-validator, per-currency cumulative reward index
///
/// Allocated rewards are escrowed at [`RewardPool::address`] until delegations
/// settle against the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPool {
    /// Validator address
    pub validator_address: Address,

    /// Reward currency
    pub currency: Currency,

    /// Cumulative reward per Share since genesis
    pub index: Decimal,

    /// Number of distribution periods opened so far
    pub period: u64,

    /// Share supply the current period divides allocations by
    pub total_shares: Decimal,
}

impl RewardPool {
    /// Fresh pool with a zero index
    pub fn new(validator_address: Address, currency: Currency) -> Self {
        Self {
            validator_address,
            currency,
            index: Decimal::ZERO,
            period: 0,
            total_shares: Decimal::ZERO,
        }
    }

    /// Escrow and record address
    pub fn address(&self) -> Address {
        Self::derive_address(&self.validator_address, self.currency)
    }

    /// Escrow and record address for a validator and currency
    pub fn derive_address(validator_address: &Address, currency: Currency) -> Address {
        validator_address.derive(format!("RewardPool{}", currency.ticker()).as_bytes())
    }

    /// Reward owed to `share` units since `snapshot`
    pub fn accrued(&self, share: &Amount, snapshot: Decimal) -> Result<Decimal> {
        let delta = self.index - snapshot;
        if delta <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        share
            .quantity()
            .checked_mul(delta)
            .ok_or_else(|| Error::ArithmeticOverflow(format!("{} * {}", share, delta)))
    }
}

/// Address where a delegator's settled rewards accumulate
pub fn reward_address(delegator_address: &Address) -> Address {
    delegator_address.derive(b"RewardAddress")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accrued() {
        let mut pool = RewardPool::new(Address::new([1u8; 20]), Currency::GovernanceToken);
        pool.index = Decimal::new(5, 2);

        let share = Amount::from_major(Currency::Share, 200);
        assert_eq!(pool.accrued(&share, Decimal::ZERO).unwrap(), Decimal::from(10));
        assert_eq!(pool.accrued(&share, pool.index).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_addresses_are_currency_scoped() {
        let validator = Address::new([1u8; 20]);
        assert_ne!(
            RewardPool::derive_address(&validator, Currency::GovernanceToken),
            RewardPool::derive_address(&validator, Currency::ConsensusToken)
        );
        assert_ne!(reward_address(&validator), validator);
    }
}
