//! Shared fixtures for staking integration tests

#![allow(dead_code)]

use dpos_core::{
    control::ValidatorCtrl,
    crypto::KeyPair,
    model::{Delegation, Validator},
    ActionContext, Address, Amount, Currency, Params, World, WorldState,
};

/// Mint `units` whole GovernanceToken to `address`
pub fn fund(world: &mut World, address: &Address, units: i64) {
    world
        .mint_asset(
            &ActionContext::new(*address, 0),
            address,
            &Amount::from_major(Currency::GovernanceToken, units),
        )
        .unwrap();
}

pub fn ncg(units: i64) -> Amount {
    Amount::from_major(Currency::GovernanceToken, units)
}

pub fn consensus(units: i64) -> Amount {
    Amount::from_major(Currency::ConsensusToken, units)
}

pub fn share(units: i64) -> Amount {
    Amount::from_major(Currency::Share, units)
}

pub fn ctx(signer: &Address, block_index: i64) -> ActionContext {
    ActionContext::new(*signer, block_index)
}

/// An operator key and the validator address it controls
pub struct Operator {
    pub keypair: KeyPair,
    pub address: Address,
    pub validator: Address,
}

impl Operator {
    pub fn from_seed(seed: u8) -> Self {
        let keypair = KeyPair::from_seed(&[seed; 32]);
        let address = keypair.address();
        Self {
            validator: Validator::derive_address(&address),
            keypair,
            address,
        }
    }

    /// Fund with `mint` and promote with `self_delegation`
    pub fn promote(&self, world: &World, block_index: i64, mint: i64, self_delegation: i64) -> World {
        let mut world = world.clone();
        fund(&mut world, &self.address, mint);
        ValidatorCtrl::create(
            &world,
            &ctx(&self.address, block_index),
            self.address,
            self.keypair.public_key(),
            &ncg(self_delegation),
        )
        .unwrap()
        .0
    }

    pub fn self_delegation(&self) -> Address {
        Delegation::derive_address(&self.address, &self.validator)
    }
}

pub fn delegator(seed: u8) -> Address {
    Address::new([seed; 20])
}

pub fn world() -> World {
    World::new(Params::default()).unwrap()
}

/// Two validators A and B with 100 self-delegated each out of 500 minted
pub fn two_validators() -> (World, Operator, Operator) {
    let a = Operator::from_seed(1);
    let b = Operator::from_seed(2);
    let world = a.promote(&world(), 1, 500, 100);
    let world = b.promote(&world, 1, 500, 100);
    (world, a, b)
}

pub fn validator(world: &World, address: &Address) -> Validator {
    ValidatorCtrl::fetch(world, address).unwrap()
}

pub fn bonded(world: &World, validator: &Address) -> Amount {
    world.get_balance(validator, Currency::ConsensusToken)
}

pub fn shares_at(world: &World, delegator: &Address, validator: &Address) -> Amount {
    world.get_balance(
        &Delegation::derive_address(delegator, validator),
        Currency::Share,
    )
}

pub fn snapshot_bytes(world: &World) -> Vec<u8> {
    bincode::serialize(world).unwrap()
}
