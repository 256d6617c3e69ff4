//! State snapshot abstraction
//!
//! [`WorldState`] is the seam between the staking controls and whatever store
//! holds balances and records. [`World`] is the in-memory implementation: a
//! plain value that is cloned into a scratch copy by every public entry point,
//! so a failed operation leaves the caller's snapshot untouched.

use crate::config::Params;
use crate::types::{ActionContext, Address, Amount, Currency};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fungible-balance ledger plus keyed record store
pub trait WorldState: Clone {
    /// Genesis staking parameters
    fn params(&self) -> &Params;

    /// Balance of `currency` held at `address`
    fn get_balance(&self, address: &Address, currency: Currency) -> Amount;

    /// Sum of all balances of `currency`
    fn total_supply(&self, currency: Currency) -> Amount;

    /// Create `value` at `recipient`
    fn mint_asset(&mut self, ctx: &ActionContext, recipient: &Address, value: &Amount)
        -> Result<()>;

    /// Destroy `value` held at `owner`
    fn burn_asset(&mut self, ctx: &ActionContext, owner: &Address, value: &Amount) -> Result<()>;

    /// Move `value` from `sender` to `recipient`
    fn transfer_asset(
        &mut self,
        ctx: &ActionContext,
        sender: &Address,
        recipient: &Address,
        value: &Amount,
    ) -> Result<()>;

    /// Raw record bytes at `address`
    fn get_state(&self, address: &Address) -> Option<&[u8]>;

    /// Store raw record bytes at `address`
    fn set_state(&mut self, address: Address, value: Vec<u8>);

    /// Delete the record at `address`
    fn remove_state(&mut self, address: &Address);

    /// Decode the record at `address`
    fn get_record<T: DeserializeOwned>(&self, address: &Address) -> Result<Option<T>>
    where
        Self: Sized,
    {
        self.get_state(address)
            .map(|bytes| bincode::deserialize(bytes))
            .transpose()
            .map_err(Error::from)
    }

    /// Encode and store a record at `address`
    fn set_record<T: Serialize>(&mut self, address: Address, record: &T) -> Result<()>
    where
        Self: Sized,
    {
        let bytes = bincode::serialize(record)?;
        self.set_state(address, bytes);
        Ok(())
    }
}

/// In-memory state snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    params: Params,
    balances: BTreeMap<(Address, Currency), Decimal>,
    states: BTreeMap<Address, Vec<u8>>,
}

impl World {
    /// Empty world with the given genesis parameters
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            balances: BTreeMap::new(),
            states: BTreeMap::new(),
        })
    }

    /// Rebuild a world from persisted parts
    pub fn from_parts(
        params: Params,
        balances: impl IntoIterator<Item = ((Address, Currency), Decimal)>,
        states: impl IntoIterator<Item = (Address, Vec<u8>)>,
    ) -> Self {
        Self {
            params,
            balances: balances.into_iter().collect(),
            states: states.into_iter().collect(),
        }
    }

    /// Iterate non-zero balances in key order
    pub fn balances(&self) -> impl Iterator<Item = (&(Address, Currency), &Decimal)> {
        self.balances.iter()
    }

    /// Iterate records in key order
    pub fn states(&self) -> impl Iterator<Item = (&Address, &Vec<u8>)> {
        self.states.iter()
    }

    fn credit(&mut self, address: &Address, value: &Amount) -> Result<()> {
        let balance = self.get_balance(address, value.currency()).checked_add(value)?;
        self.put_balance(address, balance);
        Ok(())
    }

    fn debit(&mut self, address: &Address, value: &Amount) -> Result<()> {
        let balance = self.get_balance(address, value.currency());
        if *value > balance {
            return Err(Error::insufficient(
                value,
                &balance,
                format!("address {} has insufficient {}", address, value.currency()),
            ));
        }
        let balance = balance.checked_sub(value)?;
        self.put_balance(address, balance);
        Ok(())
    }

    fn put_balance(&mut self, address: &Address, balance: Amount) {
        let key = (*address, balance.currency());
        if balance.is_zero() {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, balance.quantity());
        }
    }
}

impl WorldState for World {
    fn params(&self) -> &Params {
        &self.params
    }

    fn get_balance(&self, address: &Address, currency: Currency) -> Amount {
        self.balances
            .get(&(*address, currency))
            .map(|quantity| Amount::new(currency, *quantity))
            .unwrap_or_else(|| Amount::zero(currency))
    }

    fn total_supply(&self, currency: Currency) -> Amount {
        let total = self
            .balances
            .iter()
            .filter(|((_, c), _)| *c == currency)
            .map(|(_, quantity)| *quantity)
            .sum::<Decimal>();
        Amount::new(currency, total)
    }

    fn mint_asset(
        &mut self,
        ctx: &ActionContext,
        recipient: &Address,
        value: &Amount,
    ) -> Result<()> {
        value.ensure_positive()?;
        self.credit(recipient, value)?;

        tracing::trace!(
            block_index = ctx.block_index,
            recipient = %recipient,
            value = %value,
            "Asset minted"
        );

        Ok(())
    }

    fn burn_asset(&mut self, ctx: &ActionContext, owner: &Address, value: &Amount) -> Result<()> {
        value.ensure_positive()?;
        self.debit(owner, value)?;

        tracing::trace!(
            block_index = ctx.block_index,
            owner = %owner,
            value = %value,
            "Asset burned"
        );

        Ok(())
    }

    fn transfer_asset(
        &mut self,
        ctx: &ActionContext,
        sender: &Address,
        recipient: &Address,
        value: &Amount,
    ) -> Result<()> {
        if !value.currency().is_transferable() {
            return Err(Error::NonTransferableCurrency(value.currency()));
        }
        value.ensure_positive()?;
        self.debit(sender, value)?;
        self.credit(recipient, value)?;

        tracing::trace!(
            block_index = ctx.block_index,
            sender = %sender,
            recipient = %recipient,
            value = %value,
            "Asset transferred"
        );

        Ok(())
    }

    fn get_state(&self, address: &Address) -> Option<&[u8]> {
        self.states.get(address).map(Vec::as_slice)
    }

    fn set_state(&mut self, address: Address, value: Vec<u8>) {
        self.states.insert(address, value);
    }

    fn remove_state(&mut self, address: &Address) {
        self.states.remove(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ActionContext {
        ActionContext::new(Address::default(), 1)
    }

    fn ncg(units: i64) -> Amount {
        Amount::from_major(Currency::GovernanceToken, units)
    }

    #[test]
    fn test_mint_burn_transfer() {
        let mut world = World::new(Params::default()).unwrap();
        let alice = Address::new([1u8; 20]);
        let bob = Address::new([2u8; 20]);

        world.mint_asset(&ctx(), &alice, &ncg(100)).unwrap();
        world.transfer_asset(&ctx(), &alice, &bob, &ncg(30)).unwrap();
        world.burn_asset(&ctx(), &bob, &ncg(10)).unwrap();

        assert_eq!(world.get_balance(&alice, Currency::GovernanceToken), ncg(70));
        assert_eq!(world.get_balance(&bob, Currency::GovernanceToken), ncg(20));
        assert_eq!(world.total_supply(Currency::GovernanceToken), ncg(90));
    }

    #[test]
    fn test_overdraft_rejected() {
        let mut world = World::new(Params::default()).unwrap();
        let alice = Address::new([1u8; 20]);
        world.mint_asset(&ctx(), &alice, &ncg(5)).unwrap();

        let result = world.burn_asset(&ctx(), &alice, &ncg(6));
        assert!(matches!(
            result,
            Err(Error::InsufficientFungibleAssetValue { .. })
        ));
        assert_eq!(world.get_balance(&alice, Currency::GovernanceToken), ncg(5));
    }

    #[test]
    fn test_non_transferable_currency() {
        let mut world = World::new(Params::default()).unwrap();
        let alice = Address::new([1u8; 20]);
        let share = Amount::from_major(Currency::Share, 1);
        world.mint_asset(&ctx(), &alice, &share).unwrap();

        let result = world.transfer_asset(&ctx(), &alice, &Address::default(), &share);
        assert!(matches!(result, Err(Error::NonTransferableCurrency(_))));
    }

    #[test]
    fn test_zero_balances_are_pruned() {
        let mut world = World::new(Params::default()).unwrap();
        let alice = Address::new([1u8; 20]);
        world.mint_asset(&ctx(), &alice, &ncg(5)).unwrap();
        world.burn_asset(&ctx(), &alice, &ncg(5)).unwrap();
        assert_eq!(world.balances().count(), 0);
    }

    #[test]
    fn test_record_roundtrip() {
        let mut world = World::new(Params::default()).unwrap();
        let address = Address::new([3u8; 20]);
        world.set_record(address, &vec![1u64, 2, 3]).unwrap();

        let record: Option<Vec<u64>> = world.get_record(&address).unwrap();
        assert_eq!(record, Some(vec![1, 2, 3]));

        world.remove_state(&address);
        let record: Option<Vec<u64>> = world.get_record(&address).unwrap();
        assert_eq!(record, None);
    }
}
