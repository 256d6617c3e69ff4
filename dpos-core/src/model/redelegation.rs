//! Redelegation queue records

use crate::types::{Address, Amount, Currency};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lock records for stake moved between one validator pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redelegation {
    /// Redelegation address
    pub address: Address,

    /// Delegator account
    pub delegator_address: Address,

    /// Validator the stake left
    pub src_validator_address: Address,

    /// Validator the stake was re-bonded to
    pub dst_validator_address: Address,

    /// Index assigned to the next entry
    pub redelegation_entry_index: i64,

    /// Live entries by index
    pub redelegation_entry_addresses: BTreeMap<i64, Address>,
}

impl Redelegation {
    /// Empty queue
    pub fn new(
        delegator_address: Address,
        src_validator_address: Address,
        dst_validator_address: Address,
    ) -> Self {
        Self {
            address: Self::derive_address(
                &delegator_address,
                &src_validator_address,
                &dst_validator_address,
            ),
            delegator_address,
            src_validator_address,
            dst_validator_address,
            redelegation_entry_index: 0,
            redelegation_entry_addresses: BTreeMap::new(),
        }
    }

    /// Redelegation address for a (delegator, src, dst) triple
    pub fn derive_address(
        delegator_address: &Address,
        src_validator_address: &Address,
        dst_validator_address: &Address,
    ) -> Address {
        let key = [
            b"Redelegation".as_slice(),
            src_validator_address.as_bytes(),
            dst_validator_address.as_bytes(),
        ]
        .concat();
        delegator_address.derive(&key)
    }

    /// Check capacity
    pub fn is_full(&self, max_entries: usize) -> bool {
        self.redelegation_entry_addresses.len() >= max_entries
    }

    /// Append an entry and advance the index
    pub fn add_entry(&mut self, entry: &RedelegationEntry) {
        self.redelegation_entry_addresses
            .insert(entry.index, entry.address);
        self.redelegation_entry_index = entry.index + 1;
    }
}

/// One redelegated amount and its lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    /// Entry address
    pub address: Address,

    /// Owning redelegation
    pub redelegation_address: Address,

    /// Share burned at the source validator
    pub redelegating_share: Amount,

    /// ConsensusToken moved between the validators
    pub unbonding_consensus_token: Amount,

    /// Share issued at the destination validator
    pub issued_share: Amount,

    /// Position in the queue
    pub index: i64,

    /// First height at which the lock is released
    pub completion_block_height: i64,
}

impl RedelegationEntry {
    /// New entry locked for `unbonding_period` blocks from `block_height`
    pub fn new(
        redelegation_address: Address,
        redelegating_share: Amount,
        unbonding_consensus_token: Amount,
        issued_share: Amount,
        index: i64,
        block_height: i64,
        unbonding_period: i64,
    ) -> Result<Self> {
        redelegating_share.ensure_currency(Currency::Share)?;
        unbonding_consensus_token.ensure_currency(Currency::ConsensusToken)?;
        issued_share.ensure_currency(Currency::Share)?;
        Ok(Self {
            address: Self::derive_address(&redelegation_address, index),
            redelegation_address,
            redelegating_share,
            unbonding_consensus_token,
            issued_share,
            index,
            completion_block_height: block_height + unbonding_period,
        })
    }

    /// Entry address
    pub fn derive_address(redelegation_address: &Address, index: i64) -> Address {
        redelegation_address.derive(format!("RedelegationEntry{}", index).as_bytes())
    }

    /// Check maturity
    pub fn is_matured(&self, block_height: i64) -> bool {
        block_height >= self.completion_block_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redelegation_address_is_directional() {
        let delegator = Address::new([1u8; 20]);
        let a = Address::new([2u8; 20]);
        let b = Address::new([3u8; 20]);
        assert_ne!(
            Redelegation::derive_address(&delegator, &a, &b),
            Redelegation::derive_address(&delegator, &b, &a)
        );
    }

    #[test]
    fn test_entry_currency_checks() {
        let share = Amount::from_major(Currency::Share, 5);
        let consensus = Amount::from_major(Currency::ConsensusToken, 5);
        let address = Address::new([1u8; 20]);

        assert!(RedelegationEntry::new(
            address,
            share.clone(),
            consensus.clone(),
            share.clone(),
            0,
            1,
            10
        )
        .is_ok());
        assert!(RedelegationEntry::new(address, consensus.clone(), consensus, share, 0, 1, 10).is_err());
    }
}
