//! Lazy reward distribution

mod common;

use common::*;
use dpos_core::{
    control::{DelegateCtrl, DistributionCtrl, RedelegateCtrl},
    model::{reward_address, Delegation},
    reserved, Currency, Error, World, WorldState,
};

const DELEGATOR: u8 = 9;

fn setup() -> (World, Operator, Operator) {
    let (mut world, a, b) = two_validators();
    let d = delegator(DELEGATOR);
    fund(&mut world, &d, 500);
    let (world, _) =
        DelegateCtrl::execute(&world, &ctx(&d, 1), &d, &a.validator, &ncg(100)).unwrap();
    (world, a, b)
}

fn fund_reward_pool(world: &mut World, units: i64) {
    fund(world, &reserved::REWARD_POOL, units);
}

#[test]
fn test_allocate_is_proportional_to_share() {
    let (mut world, a, _) = setup();
    let d = delegator(DELEGATOR);
    fund_reward_pool(&mut world, 20);

    let world = DistributionCtrl::allocate(
        &world,
        &ctx(&d, 2),
        &a.validator,
        &reserved::REWARD_POOL,
        &ncg(20),
    )
    .unwrap();

    let pending =
        DistributionCtrl::pending_reward(&world, &Delegation::derive_address(&d, &a.validator))
            .unwrap();
    assert_eq!(pending, vec![ncg(10)]);
    let pending = DistributionCtrl::pending_reward(&world, &a.self_delegation()).unwrap();
    assert_eq!(pending, vec![ncg(10)]);

    let (world, withdrawn) =
        DistributionCtrl::withdraw(&world, &ctx(&d, 3), &d, &a.validator).unwrap();
    assert_eq!(withdrawn, vec![ncg(10)]);
    assert_eq!(world.get_balance(&d, Currency::GovernanceToken), ncg(410));
    assert!(world
        .get_balance(&reward_address(&d), Currency::GovernanceToken)
        .is_zero());

    let pending =
        DistributionCtrl::pending_reward(&world, &Delegation::derive_address(&d, &a.validator))
            .unwrap();
    assert_eq!(pending, vec![ncg(0)]);
}

#[test]
fn test_bond_settles_before_rate_change() {
    let (mut world, a, _) = setup();
    let d = delegator(DELEGATOR);
    let e = delegator(DELEGATOR + 1);
    fund(&mut world, &e, 500);
    fund_reward_pool(&mut world, 50);

    let world = DistributionCtrl::allocate(
        &world,
        &ctx(&d, 2),
        &a.validator,
        &reserved::REWARD_POOL,
        &ncg(20),
    )
    .unwrap();

    // A late delegator must not share in rewards allocated before it bonded.
    let (world, _) =
        DelegateCtrl::execute(&world, &ctx(&e, 3), &e, &a.validator, &ncg(100)).unwrap();
    assert_eq!(
        world.get_balance(&reward_address(&d), Currency::GovernanceToken),
        ncg(10)
    );

    let world = DistributionCtrl::allocate(
        &world,
        &ctx(&d, 4),
        &a.validator,
        &reserved::REWARD_POOL,
        &ncg(30),
    )
    .unwrap();

    let pending_d =
        DistributionCtrl::pending_reward(&world, &Delegation::derive_address(&d, &a.validator))
            .unwrap();
    let pending_e =
        DistributionCtrl::pending_reward(&world, &Delegation::derive_address(&e, &a.validator))
            .unwrap();
    assert_eq!(pending_d, vec![ncg(10)]);
    assert_eq!(pending_e, vec![ncg(10)]);
}

#[test]
fn test_redelegation_settles_source_rewards() {
    let (mut world, a, b) = setup();
    let d = delegator(DELEGATOR);
    fund_reward_pool(&mut world, 20);

    let world = DistributionCtrl::allocate(
        &world,
        &ctx(&d, 2),
        &a.validator,
        &reserved::REWARD_POOL,
        &ncg(20),
    )
    .unwrap();
    let (world, _) =
        RedelegateCtrl::execute(&world, &ctx(&d, 3), &d, &a.validator, &b.validator, &share(100))
            .unwrap();

    assert_eq!(
        world.get_balance(&reward_address(&d), Currency::GovernanceToken),
        ncg(10)
    );
}

#[test]
fn test_allocate_without_shares_fails() {
    let (mut world, a, _) = setup();
    let d = delegator(DELEGATOR);
    fund_reward_pool(&mut world, 20);
    let unknown = Operator::from_seed(77);

    let result = DistributionCtrl::allocate(
        &world,
        &ctx(&d, 2),
        &unknown.validator,
        &reserved::REWARD_POOL,
        &ncg(20),
    );
    assert!(matches!(result, Err(Error::NullValidator(_))));

    let result = DistributionCtrl::allocate(
        &world,
        &ctx(&d, 2),
        &a.validator,
        &reserved::REWARD_POOL,
        &share(20),
    );
    assert!(matches!(result, Err(Error::InvalidAmount(_))));
}

#[test]
fn test_allocate_by_power() {
    let (mut world, a, b) = setup();
    let d = delegator(DELEGATOR);
    fund_reward_pool(&mut world, 30);

    let (world, allocations) =
        DistributionCtrl::allocate_by_power(&world, &ctx(&d, 2), &reserved::REWARD_POOL).unwrap();

    assert_eq!(
        allocations,
        vec![(a.validator, ncg(20)), (b.validator, ncg(10))]
    );
    assert!(world
        .get_balance(&reserved::REWARD_POOL, Currency::GovernanceToken)
        .is_zero());

    let pending = DistributionCtrl::pending_reward(&world, &b.self_delegation()).unwrap();
    assert_eq!(pending, vec![ncg(10)]);
}
