//! Error types for the staking core

use crate::types::{Address, Amount, Currency};
use thiserror::Error;

/// Result type for staking operations
pub type Result<T> = std::result::Result<T, Error>;

/// Staking errors
///
/// Every variant aborts the whole operation. Callers discard the scratch
/// snapshot, so no partial mutation is ever observed.
#[derive(Error, Debug)]
pub enum Error {
    /// Amount denominated in the wrong currency
    #[error("Invalid currency: expected {expected}, got {actual}")]
    InvalidCurrency {
        /// Currency the operation requires
        expected: Currency,
        /// Currency that was supplied
        actual: Currency,
    },

    /// Requested amount exceeds what is held
    #[error("Insufficient fungible asset value: required {required}, available {available} ({message})")]
    InsufficientFungibleAssetValue {
        /// Requested amount
        required: Amount,
        /// Amount actually held
        available: Amount,
        /// Context
        message: String,
    },

    /// Validator does not exist
    #[error("Validator not found: {0}")]
    NullValidator(Address),

    /// Validator already exists for this operator
    #[error("Validator already exists: {0}")]
    DuplicateValidator(Address),

    /// Delegation does not exist
    #[error("Delegation not found: {0}")]
    NullDelegation(Address),

    /// Undelegation does not exist
    #[error("Undelegation not found: {0}")]
    NullUndelegation(Address),

    /// Redelegation does not exist
    #[error("Redelegation not found: {0}")]
    NullRedelegation(Address),

    /// Undelegation queue is full
    #[error("Maximum undelegation entries ({max}) reached for {address}")]
    MaximumUndelegationEntries {
        /// Undelegation address
        address: Address,
        /// Configured capacity
        max: usize,
    },

    /// Redelegation queue is full
    #[error("Maximum redelegation entries ({max}) reached for {address}")]
    MaximumRedelegationEntries {
        /// Redelegation address
        address: Address,
        /// Configured capacity
        max: usize,
    },

    /// Validator has outstanding shares but no backing tokens
    #[error("Invalid exchange rate for validator {0}")]
    InvalidExchangeRate(Address),

    /// Jail or unjail requested in the wrong state
    #[error("Validator {address} jailed state conflict (jailed: {jailed})")]
    JailedValidator {
        /// Validator address
        address: Address,
        /// Jailed flag at the time of the call
        jailed: bool,
    },

    /// Zero or negative amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Currency cannot be transferred between addresses
    #[error("Currency {0} is not transferable")]
    NonTransferableCurrency(Currency),

    /// Source and destination validators are the same
    #[error("Cannot redelegate to the same validator: {0}")]
    SelfRedelegation(Address),

    /// Stake received by redelegation is still locked
    #[error("Stake redelegated into {validator} is locked until block {until}")]
    TransitiveRedelegation {
        /// Validator holding the locked stake
        validator: Address,
        /// Completion height of the blocking entry
        until: i64,
    },

    /// Reward allocated to a validator without shares
    #[error("Validator {0} has no delegator shares to reward")]
    NoDelegatorShares(Address),

    /// Malformed Ed25519 public key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Action signer does not own the referenced key
    #[error("Unauthorized signer: expected {expected}, got {actual}")]
    UnauthorizedSigner {
        /// Address the action requires
        expected: Address,
        /// Signer of the action
        actual: Address,
    },

    /// Decimal overflow
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Invariant violation (share conservation, settlement ordering, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Malformed action payload
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an insufficient-balance failure
    pub fn insufficient(required: &Amount, available: &Amount, message: impl Into<String>) -> Self {
        Error::InsufficientFungibleAssetValue {
            required: required.clone(),
            available: available.clone(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidAction(err.to_string())
    }
}
