//! Redelegation queue

mod common;

use common::*;
use dpos_core::{
    control::{DelegateCtrl, RedelegateCtrl, UnbondingSetCtrl},
    model::{Delegation, Redelegation},
    Error, World,
};

const DELEGATOR: u8 = 9;

fn with_delegation() -> (World, Operator, Operator) {
    let (mut world, a, b) = two_validators();
    let d = delegator(DELEGATOR);
    fund(&mut world, &d, 500);
    let (world, _) =
        DelegateCtrl::execute(&world, &ctx(&d, 1), &d, &a.validator, &ncg(100)).unwrap();
    (world, a, b)
}

#[test]
fn test_invalid_currency() {
    let (world, a, b) = with_delegation();
    let d = delegator(DELEGATOR);

    let result = RedelegateCtrl::execute(
        &world,
        &ctx(&d, 1),
        &d,
        &a.validator,
        &b.validator,
        &consensus(10),
    );
    assert!(matches!(result, Err(Error::InvalidCurrency { .. })));
}

#[test]
fn test_invalid_validator() {
    let (world, a, _) = with_delegation();
    let d = delegator(DELEGATOR);
    let unknown = Operator::from_seed(42);

    let result = RedelegateCtrl::execute(
        &world,
        &ctx(&d, 1),
        &d,
        &a.validator,
        &unknown.validator,
        &share(10),
    );
    assert!(matches!(result, Err(Error::NullValidator(_))));
}

#[test]
fn test_self_redelegation_rejected() {
    let (world, a, _) = with_delegation();
    let d = delegator(DELEGATOR);

    let result =
        RedelegateCtrl::execute(&world, &ctx(&d, 1), &d, &a.validator, &a.validator, &share(10));
    assert!(matches!(result, Err(Error::SelfRedelegation(_))));
}

#[test]
fn test_max_entries() {
    let (mut world, a, b) = with_delegation();
    let d = delegator(DELEGATOR);

    for i in 0..10 {
        world = RedelegateCtrl::execute(
            &world,
            &ctx(&d, 1 + i),
            &d,
            &a.validator,
            &b.validator,
            &share(5),
        )
        .unwrap()
        .0;
    }

    let before = snapshot_bytes(&world);
    let result =
        RedelegateCtrl::execute(&world, &ctx(&d, 11), &d, &a.validator, &b.validator, &share(5));
    assert!(matches!(
        result,
        Err(Error::MaximumRedelegationEntries { max: 10, .. })
    ));
    assert_eq!(snapshot_bytes(&world), before);
}

#[test]
fn test_insufficient_share_leaves_state_untouched() {
    let (world, a, b) = with_delegation();
    let d = delegator(DELEGATOR);
    let before = snapshot_bytes(&world);

    let result = RedelegateCtrl::execute(
        &world,
        &ctx(&d, 1),
        &d,
        &a.validator,
        &b.validator,
        &share(101),
    );
    assert!(matches!(
        result,
        Err(Error::InsufficientFungibleAssetValue { .. })
    ));
    assert_eq!(snapshot_bytes(&world), before);
}

#[test]
fn test_balances_after_redelegation() {
    let (world, a, b) = with_delegation();
    let d = delegator(DELEGATOR);
    assert_eq!(bonded(&world, &a.validator), consensus(200));

    let (world, entry) =
        RedelegateCtrl::execute(&world, &ctx(&d, 1), &d, &a.validator, &b.validator, &share(100))
            .unwrap();

    assert_eq!(entry.unbonding_consensus_token, consensus(100));
    assert_eq!(entry.issued_share, share(100));
    assert_eq!(bonded(&world, &a.validator), consensus(100));
    assert_eq!(bonded(&world, &b.validator), consensus(200));
    assert!(shares_at(&world, &d, &a.validator).is_zero());
    assert_eq!(shares_at(&world, &d, &b.validator), share(100));

    let redelegation = RedelegateCtrl::fetch_redelegation(
        &world,
        &Redelegation::derive_address(&d, &a.validator, &b.validator),
    )
    .unwrap();
    assert_eq!(redelegation.redelegation_entry_addresses.len(), 1);
}

#[test]
fn test_complete_respects_maturity() {
    let (world, a, b) = with_delegation();
    let d = delegator(DELEGATOR);
    let (world, _) =
        RedelegateCtrl::execute(&world, &ctx(&d, 1), &d, &a.validator, &b.validator, &share(100))
            .unwrap();
    let address = Redelegation::derive_address(&d, &a.validator, &b.validator);

    let (world, matured) = RedelegateCtrl::complete(&world, &ctx(&d, 1000), &address).unwrap();
    assert!(matured.is_empty());
    let redelegation = RedelegateCtrl::fetch_redelegation(&world, &address).unwrap();
    assert_eq!(redelegation.redelegation_entry_addresses.len(), 1);

    let before_b = bonded(&world, &b.validator);
    let (world, matured) =
        RedelegateCtrl::complete(&world, &ctx(&d, 50_400 * 5 + 1), &address).unwrap();
    assert_eq!(matured.len(), 1);
    let redelegation = RedelegateCtrl::fetch_redelegation(&world, &address).unwrap();
    assert!(redelegation.redelegation_entry_addresses.is_empty());
    assert_eq!(bonded(&world, &b.validator), before_b);
    assert!(UnbondingSetCtrl::get(&world).unwrap().is_empty());

    let dst = DelegateCtrl::fetch_delegation(&world, &Delegation::derive_address(&d, &b.validator))
        .unwrap();
    assert!(dst.incoming_redelegations.is_empty());
}

#[test]
fn test_redelegated_stake_is_locked_until_maturity() {
    let (mut world, a, b) = with_delegation();
    let c = Operator::from_seed(3);
    world = c.promote(&world, 1, 500, 100);
    let d = delegator(DELEGATOR);

    let (world, _) =
        RedelegateCtrl::execute(&world, &ctx(&d, 1), &d, &a.validator, &b.validator, &share(50))
            .unwrap();

    let result =
        RedelegateCtrl::execute(&world, &ctx(&d, 2), &d, &b.validator, &c.validator, &share(10));
    assert!(matches!(
        result,
        Err(Error::TransitiveRedelegation { until, .. }) if until == 1 + 50_400 * 5
    ));

    let height = 1 + 50_400 * 5;
    assert!(RedelegateCtrl::execute(
        &world,
        &ctx(&d, height),
        &d,
        &b.validator,
        &c.validator,
        &share(10)
    )
    .is_ok());
}

#[test]
fn test_directly_bonded_stake_is_not_locked() {
    let (mut world, a, b) = with_delegation();
    let c = Operator::from_seed(3);
    world = c.promote(&world, 1, 500, 100);
    let d = delegator(DELEGATOR);
    let (world, _) =
        DelegateCtrl::execute(&world, &ctx(&d, 1), &d, &b.validator, &ncg(100)).unwrap();

    let (world, entry) =
        RedelegateCtrl::execute(&world, &ctx(&d, 1), &d, &a.validator, &b.validator, &share(30))
            .unwrap();
    assert_eq!(entry.issued_share, share(30));
    assert_eq!(shares_at(&world, &d, &b.validator), share(130));

    let dst = DelegateCtrl::fetch_delegation(&world, &Delegation::derive_address(&d, &b.validator))
        .unwrap();
    let (locked, until) = RedelegateCtrl::locked_share(&world, &ctx(&d, 2), &dst).unwrap();
    assert_eq!(locked, share(30));
    assert_eq!(until, Some(1 + 50_400 * 5));

    // The 100 bonded directly to B can move on
    let (world, _) =
        RedelegateCtrl::execute(&world, &ctx(&d, 2), &d, &b.validator, &c.validator, &share(100))
            .unwrap();
    assert_eq!(shares_at(&world, &d, &b.validator), share(30));
    assert_eq!(shares_at(&world, &d, &c.validator), share(100));

    let before = snapshot_bytes(&world);
    let result =
        RedelegateCtrl::execute(&world, &ctx(&d, 3), &d, &b.validator, &c.validator, &share(1));
    assert!(matches!(result, Err(Error::TransitiveRedelegation { .. })));
    assert_eq!(snapshot_bytes(&world), before);
}
