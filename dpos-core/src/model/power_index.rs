//! Validator power ranking

use crate::types::{reserved, Address, Amount, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Validator and its bonded ConsensusToken at the last index update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorPower {
    /// Validator address
    pub validator_address: Address,

    /// Bonded ConsensusToken quantity
    pub power: Decimal,
}

impl ValidatorPower {
    /// Create new entry
    pub fn new(validator_address: Address, consensus_token: &Amount) -> Self {
        Self {
            validator_address,
            power: consensus_token.quantity(),
        }
    }

    /// Bonded power as a ConsensusToken amount
    pub fn consensus_token(&self) -> Amount {
        Amount::new(Currency::ConsensusToken, self.power)
    }
}

// Highest power first; ties broken by ascending address.
impl Ord for ValidatorPower {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .power
            .cmp(&self.power)
            .then_with(|| self.validator_address.cmp(&other.validator_address))
    }
}

impl PartialOrd for ValidatorPower {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ranked set of unjailed validators with non-zero power
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorPowerIndex {
    /// Entries in rank order
    pub index: BTreeSet<ValidatorPower>,
}

impl ValidatorPowerIndex {
    /// Record address
    pub fn address() -> Address {
        reserved::VALIDATOR_POWER_INDEX
    }

    /// Validator addresses in rank order
    pub fn validator_addresses(&self) -> Vec<Address> {
        self.index.iter().map(|entry| entry.validator_address).collect()
    }

    /// Top `n` entries
    pub fn top(&self, n: usize) -> impl Iterator<Item = &ValidatorPower> {
        self.index.iter().take(n)
    }

    /// Whether a validator is ranked
    pub fn contains(&self, validator_address: &Address) -> bool {
        self.index
            .iter()
            .any(|entry| entry.validator_address == *validator_address)
    }

    /// Drop a validator from the ranking
    pub fn remove(&mut self, validator_address: &Address) {
        self.index
            .retain(|entry| entry.validator_address != *validator_address);
    }

    /// Insert or re-rank a validator
    pub fn upsert(&mut self, entry: ValidatorPower) {
        self.remove(&entry.validator_address);
        self.index.insert(entry);
    }

    /// Number of ranked validators
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
