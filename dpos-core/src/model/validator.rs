//! Validator record

use crate::crypto::PublicKey;
use crate::types::{Address, Amount, Currency};
use serde::{Deserialize, Serialize};

/// A validator and the total shares issued against its bonded pool
///
/// The validator's ConsensusToken balance, held at [`Validator::address`], is
/// the pool backing `delegator_shares`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Validator address (derived from the operator)
    pub address: Address,

    /// Operator account
    pub operator_address: Address,

    /// Operator public key
    pub operator_public_key: PublicKey,

    /// Excluded from the power index while set
    pub jailed: bool,

    /// Sum of Share balances of all delegations bonded here
    pub delegator_shares: Amount,
}

impl Validator {
    /// New unjailed validator with no shares
    pub fn new(operator_address: Address, operator_public_key: PublicKey) -> Self {
        Self {
            address: Self::derive_address(&operator_address),
            operator_address,
            operator_public_key,
            jailed: false,
            delegator_shares: Amount::zero(Currency::Share),
        }
    }

    /// Validator address owned by an operator
    pub fn derive_address(operator_address: &Address) -> Address {
        operator_address.derive(b"Validator")
    }
}
