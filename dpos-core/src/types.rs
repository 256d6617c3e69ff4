//! Core types for the staking ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for token quantities)

use crate::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Set of currencies whose rewards are tracked per validator
pub type NativeTokens = BTreeSet<Currency>;

/// 20-byte account / record address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Address length in bytes
    pub const LENGTH: usize = 20;

    /// Create from raw bytes
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    const fn reserved(tag: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Deterministically derive a child address: `SHA-256(self || key)[..20]`
    pub fn derive(&self, key: &[u8]) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(key);
        let digest: [u8; 32] = hasher.finalize().into();

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address(bytes)
    }

    /// Lower-case hex with `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex (with or without `0x` prefix)
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 20]>::deserialize(deserializer).map(Address)
        }
    }
}

/// Well-known system addresses
pub mod reserved {
    use super::Address;

    /// Holds the GovernanceToken backing every bonded or unbonding ConsensusToken
    pub const UNBONDED_POOL: Address = Address::reserved(1);

    /// Collects block rewards until they are allocated to validators
    pub const REWARD_POOL: Address = Address::reserved(2);

    /// Location of the validator power index record
    pub const VALIDATOR_POWER_INDEX: Address = Address::reserved(3);

    /// Location of the unbonding set record
    pub const UNBONDING_SET: Address = Address::reserved(4);
}

/// Currencies known to the staking ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    /// Liquid governance token
    GovernanceToken,
    /// Bonded 1:1 representation of the governance token
    ConsensusToken,
    /// Per-validator claim on the bonded pool
    Share,
}

impl Currency {
    /// Ticker symbol
    pub fn ticker(&self) -> &'static str {
        match self {
            Currency::GovernanceToken => "NCG",
            Currency::ConsensusToken => "ConsensusToken",
            Currency::Share => "Share",
        }
    }

    /// Number of decimal places quantities are truncated to
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::GovernanceToken => 2,
            Currency::ConsensusToken | Currency::Share => 18,
        }
    }

    /// Whether balances may move between addresses
    pub fn is_transferable(&self) -> bool {
        matches!(self, Currency::GovernanceToken)
    }

    /// Parse from ticker
    pub fn from_ticker(s: &str) -> Option<Self> {
        match s {
            "NCG" => Some(Currency::GovernanceToken),
            "ConsensusToken" => Some(Currency::ConsensusToken),
            "Share" => Some(Currency::Share),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

/// Quantity of a single currency (exact decimal)
///
/// Quantities are truncated toward zero to the currency's decimal places and
/// normalized, so equal values always serialize to equal bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAmount")]
pub struct Amount {
    currency: Currency,
    quantity: Decimal,
}

#[derive(Deserialize)]
struct RawAmount {
    currency: Currency,
    quantity: Decimal,
}

impl From<RawAmount> for Amount {
    fn from(raw: RawAmount) -> Self {
        Amount::new(raw.currency, raw.quantity)
    }
}

impl Amount {
    /// Create new amount
    pub fn new(currency: Currency, quantity: Decimal) -> Self {
        let quantity = quantity
            .round_dp_with_strategy(currency.decimal_places(), RoundingStrategy::ToZero)
            .normalize();
        Self { currency, quantity }
    }

    /// Zero of the given currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            currency,
            quantity: Decimal::ZERO,
        }
    }

    /// Whole units of the given currency
    pub fn from_major(currency: Currency, units: i64) -> Self {
        Self::new(currency, Decimal::from(units))
    }

    /// Currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Quantity
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Check if strictly positive
    pub fn is_positive(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Fail unless denominated in `expected`
    pub fn ensure_currency(&self, expected: Currency) -> Result<()> {
        if self.currency != expected {
            return Err(Error::InvalidCurrency {
                expected,
                actual: self.currency,
            });
        }
        Ok(())
    }

    /// Fail unless strictly positive
    pub fn ensure_positive(&self) -> Result<()> {
        if !self.is_positive() {
            return Err(Error::InvalidAmount(format!("{} must be positive", self)));
        }
        Ok(())
    }

    /// Add two amounts of the same currency
    pub fn checked_add(&self, other: &Amount) -> Result<Amount> {
        other.ensure_currency(self.currency)?;
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or_else(|| Error::ArithmeticOverflow(format!("{} + {}", self, other)))?;
        Ok(Amount::new(self.currency, quantity))
    }

    /// Subtract an amount of the same currency
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount> {
        other.ensure_currency(self.currency)?;
        let quantity = self
            .quantity
            .checked_sub(other.quantity)
            .ok_or_else(|| Error::ArithmeticOverflow(format!("{} - {}", self, other)))?;
        Ok(Amount::new(self.currency, quantity))
    }

    /// `self * numerator / denominator`, re-denominated in `to`
    pub fn mul_div(&self, numerator: Decimal, denominator: Decimal, to: Currency) -> Result<Amount> {
        if denominator.is_zero() {
            return Err(Error::ArithmeticOverflow(format!(
                "{} * {} / 0",
                self, numerator
            )));
        }
        let quantity = self
            .quantity
            .checked_mul(numerator)
            .and_then(|product| product.checked_div(denominator))
            .ok_or_else(|| {
                Error::ArithmeticOverflow(format!("{} * {} / {}", self, numerator, denominator))
            })?;
        Ok(Amount::new(to, quantity))
    }

    /// Same quantity in another currency (truncated to its decimal places)
    pub fn convert(&self, to: Currency) -> Amount {
        Amount::new(to, self.quantity)
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        self.quantity.partial_cmp(&other.quantity)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.currency)
    }
}

/// Execution context handed to every state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    /// Acting address
    pub signer: Address,

    /// Current block height
    pub block_index: i64,
}

impl ActionContext {
    /// Create new context
    pub fn new(signer: Address, block_index: i64) -> Self {
        Self {
            signer,
            block_index,
        }
    }
}
