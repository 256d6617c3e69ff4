//! System actions end to end

mod common;

use common::*;
use dpos_core::{
    control::{ValidatorCtrl, ValidatorPowerIndexCtrl},
    Action, Currency, Error, WorldState,
};

#[test]
fn test_promote_requires_key_owner() {
    let operator = Operator::from_seed(1);
    let other = Operator::from_seed(2);
    let mut world = world();
    fund(&mut world, &other.address, 500);

    let action = Action::PromoteValidator {
        public_key: operator.keypair.public_key(),
        amount: ncg(100),
    };
    assert!(matches!(
        action.execute(&world, &ctx(&other.address, 1)),
        Err(Error::UnauthorizedSigner { .. })
    ));
}

#[test]
fn test_delegate_undelegate_and_withdraw_flow() {
    let operator = Operator::from_seed(1);
    let d = delegator(9);
    let mut world = world();
    fund(&mut world, &operator.address, 500);
    fund(&mut world, &d, 300);

    let world = Action::PromoteValidator {
        public_key: operator.keypair.public_key(),
        amount: ncg(100),
    }
    .execute(&world, &ctx(&operator.address, 1))
    .unwrap();

    let world = Action::Delegate {
        validator: operator.validator,
        amount: ncg(100),
    }
    .execute(&world, &ctx(&d, 2))
    .unwrap();
    assert_eq!(shares_at(&world, &d, &operator.validator), share(100));

    let world = Action::Undelegate {
        validator: operator.validator,
        share: share(60),
    }
    .execute(&world, &ctx(&d, 3))
    .unwrap();

    let world = Action::CancelUndelegation {
        validator: operator.validator,
        amount: consensus(20),
    }
    .execute(&world, &ctx(&d, 4))
    .unwrap();
    assert_eq!(shares_at(&world, &d, &operator.validator), share(60));

    let world = Action::WithdrawDelegator {
        validator: operator.validator,
    }
    .execute(&world, &ctx(&d, 5))
    .unwrap();
    assert_eq!(world.get_balance(&d, Currency::GovernanceToken), ncg(200));
}

#[test]
fn test_unjail_requires_restored_self_delegation() {
    let operator = Operator::from_seed(1);
    let world = operator.promote(&world(), 1, 500, 100);

    let world = Action::Undelegate {
        validator: operator.validator,
        share: share(100),
    }
    .execute(&world, &ctx(&operator.address, 2))
    .unwrap();
    assert!(validator(&world, &operator.validator).jailed);

    let unjail = Action::UnjailValidator {
        validator: operator.validator,
    };
    assert!(matches!(
        unjail.execute(&world, &ctx(&operator.address, 3)),
        Err(Error::InsufficientFungibleAssetValue { .. })
    ));

    let world = Action::Delegate {
        validator: operator.validator,
        amount: ncg(50),
    }
    .execute(&world, &ctx(&operator.address, 3))
    .unwrap();

    assert!(matches!(
        unjail.execute(&world, &ctx(&delegator(9), 4)),
        Err(Error::UnauthorizedSigner { .. })
    ));

    let world = unjail.execute(&world, &ctx(&operator.address, 4)).unwrap();
    assert!(!ValidatorCtrl::fetch(&world, &operator.validator).unwrap().jailed);
    assert!(ValidatorPowerIndexCtrl::get(&world)
        .unwrap()
        .contains(&operator.validator));
}
