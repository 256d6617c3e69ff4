//! Registry of queues with live entries

use crate::types::{reserved, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Undelegation and redelegation addresses awaiting maturity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingSet {
    /// Undelegations with at least one entry
    pub undelegation_addresses: BTreeSet<Address>,

    /// Redelegations with at least one entry
    pub redelegation_addresses: BTreeSet<Address>,
}

impl UnbondingSet {
    /// Record address
    pub fn address() -> Address {
        reserved::UNBONDING_SET
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.undelegation_addresses.is_empty() && self.redelegation_addresses.is_empty()
    }
}
