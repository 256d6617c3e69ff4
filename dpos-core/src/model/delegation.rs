//! Delegation records

use crate::types::{Address, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Bond between one delegator and one validator
///
/// The Share balance lives in the asset ledger at [`Delegation::address`];
/// the record only carries distribution bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Delegation address
    pub address: Address,

    /// Delegator account
    pub delegator_address: Address,

    /// Validator address
    pub validator_address: Address,

    /// Height of the last reward settlement
    pub latest_distribute_height: i64,

    /// Reward-per-share index observed at the last settlement, per currency
    pub reward_snapshots: BTreeMap<Currency, Decimal>,

    /// Redelegations by the same delegator into this validator
    pub incoming_redelegations: BTreeSet<Address>,
}

impl Delegation {
    /// New delegation with no settlement history
    pub fn new(delegator_address: Address, validator_address: Address) -> Self {
        Self {
            address: Self::derive_address(&delegator_address, &validator_address),
            delegator_address,
            validator_address,
            latest_distribute_height: 0,
            reward_snapshots: BTreeMap::new(),
            incoming_redelegations: BTreeSet::new(),
        }
    }

    /// Delegation address for a (delegator, validator) pair
    pub fn derive_address(delegator_address: &Address, validator_address: &Address) -> Address {
        let key = [b"Delegation".as_slice(), validator_address.as_bytes()].concat();
        delegator_address.derive(&key)
    }
}

/// Delegation addresses currently holding Share at a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDelegationSet {
    /// Validator address
    pub validator_address: Address,

    /// Bonded delegation addresses
    pub set: BTreeSet<Address>,
}

impl ValidatorDelegationSet {
    /// Empty set for a validator
    pub fn new(validator_address: Address) -> Self {
        Self {
            validator_address,
            set: BTreeSet::new(),
        }
    }

    /// Record address
    pub fn address(&self) -> Address {
        Self::derive_address(&self.validator_address)
    }

    /// Record address for a validator
    pub fn derive_address(validator_address: &Address) -> Address {
        validator_address.derive(b"ValidatorDelegationSet")
    }
}
