//! Undelegation queue records

use crate::types::{Address, Amount, Currency};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Time-locked unbonding queue of one (delegator, validator) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Undelegation {
    /// Undelegation address
    pub address: Address,

    /// Delegator account
    pub delegator_address: Address,

    /// Validator the stake was unbonded from
    pub validator_address: Address,

    /// Index assigned to the next entry
    pub undelegation_entry_index: i64,

    /// Live entries by index
    pub undelegation_entry_addresses: BTreeMap<i64, Address>,
}

impl Undelegation {
    /// Empty queue
    pub fn new(delegator_address: Address, validator_address: Address) -> Self {
        Self {
            address: Self::derive_address(&delegator_address, &validator_address),
            delegator_address,
            validator_address,
            undelegation_entry_index: 0,
            undelegation_entry_addresses: BTreeMap::new(),
        }
    }

    /// Undelegation address for a (delegator, validator) pair
    pub fn derive_address(delegator_address: &Address, validator_address: &Address) -> Address {
        let key = [b"Undelegation".as_slice(), validator_address.as_bytes()].concat();
        delegator_address.derive(&key)
    }

    /// Check capacity
    pub fn is_full(&self, max_entries: usize) -> bool {
        self.undelegation_entry_addresses.len() >= max_entries
    }

    /// Append an entry and advance the index
    pub fn add_entry(&mut self, entry: &UndelegationEntry) {
        self.undelegation_entry_addresses
            .insert(entry.index, entry.address);
        self.undelegation_entry_index = entry.index + 1;
    }
}

/// One locked unbonding amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndelegationEntry {
    /// Entry address
    pub address: Address,

    /// Owning undelegation
    pub undelegation_address: Address,

    /// Locked ConsensusToken
    pub unbonding_consensus_token: Amount,

    /// Position in the queue
    pub index: i64,

    /// First height at which the entry may be completed
    pub completion_block_height: i64,
}

impl UndelegationEntry {
    /// New entry locked for `unbonding_period` blocks from `block_height`
    pub fn new(
        undelegation_address: Address,
        unbonding_consensus_token: Amount,
        index: i64,
        block_height: i64,
        unbonding_period: i64,
    ) -> Result<Self> {
        unbonding_consensus_token.ensure_currency(Currency::ConsensusToken)?;
        Ok(Self {
            address: Self::derive_address(&undelegation_address, index),
            undelegation_address,
            unbonding_consensus_token,
            index,
            completion_block_height: block_height + unbonding_period,
        })
    }

    /// Entry address
    pub fn derive_address(undelegation_address: &Address, index: i64) -> Address {
        undelegation_address.derive(format!("UndelegationEntry{}", index).as_bytes())
    }

    /// Check maturity
    pub fn is_matured(&self, block_height: i64) -> bool {
        block_height >= self.completion_block_height
    }
}
