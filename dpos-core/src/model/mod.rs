//! Persisted staking records
//!
//! Every record lives at a deterministic [`Address`](crate::types::Address)
//! derived from the identities it belongs to, and is stored through
//! [`WorldState::set_record`](crate::WorldState::set_record).

pub mod delegation;
pub mod power_index;
pub mod redelegation;
pub mod reward;
pub mod undelegation;
pub mod unbonding_set;
pub mod validator;

pub use delegation::{Delegation, ValidatorDelegationSet};
pub use power_index::{ValidatorPower, ValidatorPowerIndex};
pub use redelegation::{Redelegation, RedelegationEntry};
pub use reward::{reward_address, RewardPool};
pub use undelegation::{Undelegation, UndelegationEntry};
pub use unbonding_set::UnbondingSet;
pub use validator::Validator;
