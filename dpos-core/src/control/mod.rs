//! State-transition controls
//!
//! Public entry points take the caller's snapshot by reference and return a new
//! snapshot on success. The `*_mut` variants operate on a scratch copy owned by
//! an enclosing entry point and are composed to build the larger protocols.

pub mod bond;
pub mod delegate;
pub mod delegation_set;
pub mod distribution;
pub mod power_index;
pub mod redelegate;
pub mod unbonding_set;
pub mod undelegate;
pub mod validator;

pub use bond::Bond;
pub use delegate::DelegateCtrl;
pub use delegation_set::ValidatorDelegationSetCtrl;
pub use distribution::{DistributionCtrl, Settled};
pub use power_index::ValidatorPowerIndexCtrl;
pub use redelegate::RedelegateCtrl;
pub use unbonding_set::{MaturedEntries, UnbondingSetCtrl};
pub use undelegate::UndelegateCtrl;
pub use validator::ValidatorCtrl;
