//! System actions
//!
//! The transaction-facing surface of the staking core. Each action resolves
//! the signer's addresses and calls into the controls; the JSON plain value
//! carries a `type_id` tag.

use crate::control::{
    DelegateCtrl, DistributionCtrl, RedelegateCtrl, UndelegateCtrl, ValidatorCtrl,
};
use crate::crypto::PublicKey;
use crate::model::Undelegation;
use crate::types::{ActionContext, Address, Amount};
use crate::world::WorldState;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Staking action signed by `ActionContext::signer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type_id", rename_all = "snake_case")]
pub enum Action {
    /// Register the signer as a validator with a GovernanceToken self-delegation
    PromoteValidator {
        /// Operator key; must belong to the signer
        public_key: PublicKey,
        /// Self-delegation
        amount: Amount,
    },

    /// Bond GovernanceToken to a validator
    Delegate {
        /// Validator address
        validator: Address,
        /// GovernanceToken to bond
        amount: Amount,
    },

    /// Begin unbonding Share from a validator
    Undelegate {
        /// Validator address
        validator: Address,
        /// Share to unbond
        share: Amount,
    },

    /// Re-bond ConsensusToken still locked in unmatured undelegation entries
    CancelUndelegation {
        /// Validator address
        validator: Address,
        /// Locked ConsensusToken to re-bond
        amount: Amount,
    },

    /// Move bonded Share to another validator
    Redelegate {
        /// Validator the stake leaves
        src_validator: Address,
        /// Validator the stake moves to
        dst_validator: Address,
        /// Share to move
        share: Amount,
    },

    /// Collect settled rewards from a validator
    WithdrawDelegator {
        /// Validator address
        validator: Address,
    },

    /// Lift a jail once self-delegation is restored
    UnjailValidator {
        /// Validator address
        validator: Address,
    },
}

impl Action {
    /// Action type identifier
    pub fn type_id(&self) -> &'static str {
        match self {
            Action::PromoteValidator { .. } => "promote_validator",
            Action::Delegate { .. } => "delegate",
            Action::Undelegate { .. } => "undelegate",
            Action::CancelUndelegation { .. } => "cancel_undelegation",
            Action::Redelegate { .. } => "redelegate",
            Action::WithdrawDelegator { .. } => "withdraw_delegator",
            Action::UnjailValidator { .. } => "unjail_validator",
        }
    }

    /// JSON plain value
    pub fn plain_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode from a JSON plain value
    pub fn from_plain_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Apply to `world`, returning the new snapshot
    pub fn execute<W: WorldState>(&self, world: &W, ctx: &ActionContext) -> Result<W> {
        let signer = ctx.signer;

        let next = match self {
            Action::PromoteValidator { public_key, amount } => {
                if public_key.address() != signer {
                    return Err(Error::UnauthorizedSigner {
                        expected: public_key.address(),
                        actual: signer,
                    });
                }
                ValidatorCtrl::create(world, ctx, signer, *public_key, amount)?.0
            }
            Action::Delegate { validator, amount } => {
                DelegateCtrl::execute(world, ctx, &signer, validator, amount)?.0
            }
            Action::Undelegate { validator, share } => {
                UndelegateCtrl::execute(world, ctx, &signer, validator, share)?.0
            }
            Action::CancelUndelegation { validator, amount } => {
                let undelegation = Undelegation::derive_address(&signer, validator);
                UndelegateCtrl::cancel(world, ctx, &undelegation, amount)?.0
            }
            Action::Redelegate {
                src_validator,
                dst_validator,
                share,
            } => RedelegateCtrl::execute(world, ctx, &signer, src_validator, dst_validator, share)?.0,
            Action::WithdrawDelegator { validator } => {
                DistributionCtrl::withdraw(world, ctx, &signer, validator)?.0
            }
            Action::UnjailValidator { validator } => Self::unjail(world, &signer, validator)?,
        };

        tracing::debug!(
            block_index = ctx.block_index,
            signer = %signer,
            type_id = self.type_id(),
            "Action executed"
        );

        Ok(next)
    }

    fn unjail<W: WorldState>(world: &W, signer: &Address, validator_address: &Address) -> Result<W> {
        let validator = ValidatorCtrl::fetch(world, validator_address)?;
        if validator.operator_address != *signer {
            return Err(Error::UnauthorizedSigner {
                expected: validator.operator_address,
                actual: *signer,
            });
        }

        let self_delegation = ValidatorCtrl::self_delegation(world, &validator)?;
        let minimum = world.params().min_self_delegation();
        if self_delegation < minimum {
            return Err(Error::insufficient(
                &minimum,
                &self_delegation,
                format!("validator {} self-delegation is below the minimum", validator_address),
            ));
        }

        ValidatorCtrl::unjail(world, validator_address)
    }
}
