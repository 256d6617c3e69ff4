//! Staking engine integration tests

use dpos_core::{
    control::UnbondingSetCtrl,
    crypto::KeyPair,
    model::{Undelegation, Validator},
    Action, Address, Amount, Currency, Params, WorldState,
};
use dpos_node::{config::GenesisAllocation, Config, Error, ReplayEntry, StakingEngine};
use rust_decimal::Decimal;
use std::io::Cursor;
use tempfile::TempDir;

fn ncg(units: i64) -> Amount {
    Amount::from_major(Currency::GovernanceToken, units)
}

fn share(units: i64) -> Amount {
    Amount::from_major(Currency::Share, units)
}

struct Fixture {
    _dir: TempDir,
    config: Config,
    operator: KeyPair,
    delegator: Address,
}

impl Fixture {
    fn new(block_reward: i64) -> Self {
        let dir = TempDir::new().unwrap();
        let operator = KeyPair::from_seed(&[7u8; 32]);
        let delegator = Address::new([9u8; 20]);

        let config = Config {
            data_dir: dir.path().to_path_buf(),
            block_reward: Decimal::from(block_reward),
            params: Params {
                unbonding_period: 3,
                ..Params::default()
            },
            genesis: vec![
                GenesisAllocation {
                    address: operator.address(),
                    amount: ncg(100),
                },
                GenesisAllocation {
                    address: delegator,
                    amount: ncg(50),
                },
            ],
            ..Config::default()
        };

        Self {
            _dir: dir,
            config,
            operator,
            delegator,
        }
    }

    fn validator(&self) -> Address {
        Validator::derive_address(&self.operator.address())
    }

    fn promote(&self) -> Action {
        Action::PromoteValidator {
            public_key: self.operator.public_key(),
            amount: ncg(100),
        }
    }
}

#[test]
fn test_genesis_is_committed_on_first_open() {
    let fixture = Fixture::new(0);
    let engine = StakingEngine::open(&fixture.config).unwrap();

    assert_eq!(engine.height(), 1);
    assert_eq!(
        engine
            .world()
            .get_balance(&fixture.delegator, Currency::GovernanceToken),
        ncg(50)
    );
}

#[test]
fn test_committed_blocks_survive_restart() {
    let fixture = Fixture::new(0);

    let snapshot = {
        let mut engine = StakingEngine::open(&fixture.config).unwrap();
        engine
            .apply(fixture.operator.address(), &fixture.promote())
            .unwrap();
        let summary = engine.end_block().unwrap();
        assert_eq!(summary.height, 1);
        assert_eq!(summary.applied, 1);
        engine.world().clone()
    };

    let engine = StakingEngine::open(&fixture.config).unwrap();
    assert_eq!(engine.height(), 2);
    assert_eq!(engine.world(), &snapshot);
}

#[test]
fn test_uncommitted_actions_are_lost_on_restart() {
    let fixture = Fixture::new(0);

    {
        let mut engine = StakingEngine::open(&fixture.config).unwrap();
        engine
            .apply(fixture.operator.address(), &fixture.promote())
            .unwrap();
    }

    let engine = StakingEngine::open(&fixture.config).unwrap();
    assert_eq!(engine.height(), 1);
    assert_eq!(
        engine
            .world()
            .get_balance(&fixture.operator.address(), Currency::GovernanceToken),
        ncg(100)
    );
}

#[test]
fn test_rejected_action_leaves_world_unchanged() {
    let fixture = Fixture::new(0);
    let mut engine = StakingEngine::open(&fixture.config).unwrap();
    let before = engine.world().clone();

    // Signer does not own the key
    let result = engine.apply(fixture.delegator, &fixture.promote());
    assert!(matches!(
        result,
        Err(Error::Staking(dpos_core::Error::UnauthorizedSigner { .. }))
    ));
    assert_eq!(engine.world(), &before);

    let summary = engine.end_block().unwrap();
    assert_eq!(summary.applied, 0);
    assert_eq!(summary.failed, 1);
}

#[test]
fn test_undelegation_pays_out_at_maturity() {
    let fixture = Fixture::new(0);
    let validator = fixture.validator();
    let mut engine = StakingEngine::open(&fixture.config).unwrap();

    // Height 1
    engine
        .apply(fixture.operator.address(), &fixture.promote())
        .unwrap();
    engine
        .apply(
            fixture.delegator,
            &Action::Delegate {
                validator,
                amount: ncg(50),
            },
        )
        .unwrap();
    engine.end_block().unwrap();
    assert_eq!(
        engine
            .world()
            .get_balance(&fixture.delegator, Currency::GovernanceToken),
        ncg(0)
    );

    // Height 2, completes at 5
    engine
        .apply(
            fixture.delegator,
            &Action::Undelegate {
                validator,
                share: share(50),
            },
        )
        .unwrap();
    let undelegation = Undelegation::derive_address(&fixture.delegator, &validator);

    for height in 2..5 {
        let summary = engine.end_block().unwrap();
        assert_eq!(summary.height, height);
        assert_eq!(summary.matured.total(), 0);
    }

    let summary = engine.end_block().unwrap();
    assert_eq!(summary.height, 5);
    assert_eq!(summary.matured.undelegation_entries, 1);
    assert_eq!(
        engine
            .world()
            .get_balance(&fixture.delegator, Currency::GovernanceToken),
        ncg(50)
    );
    assert_eq!(
        engine
            .world()
            .get_balance(&undelegation, Currency::ConsensusToken),
        Amount::zero(Currency::ConsensusToken)
    );
    assert!(UnbondingSetCtrl::get(engine.world())
        .unwrap()
        .undelegation_addresses
        .is_empty());
}

#[test]
fn test_block_reward_reaches_delegator() {
    let fixture = Fixture::new(10);
    let validator = fixture.validator();
    let mut engine = StakingEngine::open(&fixture.config).unwrap();

    engine
        .apply(fixture.operator.address(), &fixture.promote())
        .unwrap();
    let summary = engine.end_block().unwrap();
    assert_eq!(summary.allocations, 1);

    engine
        .apply(
            fixture.operator.address(),
            &Action::WithdrawDelegator { validator },
        )
        .unwrap();

    assert_eq!(
        engine
            .world()
            .get_balance(&fixture.operator.address(), Currency::GovernanceToken),
        ncg(10)
    );
}

#[test]
fn test_replay_log() {
    let fixture = Fixture::new(0);
    let validator = fixture.validator();
    let mut engine = StakingEngine::open(&fixture.config).unwrap();

    let entries = vec![
        ReplayEntry::Action {
            signer: fixture.operator.address(),
            action: fixture.promote(),
        },
        ReplayEntry::EndBlock,
        ReplayEntry::Action {
            signer: fixture.delegator,
            action: Action::Delegate {
                validator,
                amount: ncg(20),
            },
        },
        // Overdraft
        ReplayEntry::Action {
            signer: fixture.delegator,
            action: Action::Delegate {
                validator,
                amount: ncg(40),
            },
        },
    ];
    let mut log = String::new();
    for entry in &entries {
        log.push_str(&serde_json::to_string(entry).unwrap());
        log.push_str("\n\n");
    }

    let summary = engine.replay(Cursor::new(log)).unwrap();
    assert_eq!(summary.blocks, 2);
    assert_eq!(summary.applied, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(engine.height(), 3);
    assert_eq!(
        engine
            .world()
            .get_balance(&fixture.delegator, Currency::GovernanceToken),
        ncg(30)
    );
}

#[test]
fn test_replay_rejects_malformed_line() {
    let fixture = Fixture::new(0);
    let mut engine = StakingEngine::open(&fixture.config).unwrap();

    let log = "{\"kind\":\"end_block\"}\n{\"kind\":\"bogus\"}\n";
    let result = engine.replay(Cursor::new(log));
    assert!(matches!(result, Err(Error::InvalidInput { line: 2, .. })));
}
