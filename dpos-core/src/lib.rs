//! DPoS Staking Core
//!
//! Deterministic state transitions for bonding a liquid governance token to
//! validators, time-locked unbonding and redelegation, and lazy reward
//! distribution.
//!
//! # Architecture
//!
//! - **Snapshot in, snapshot out**: every entry point takes `&W: WorldState`
//!   and returns a new snapshot, so a failure never leaks partial state
//! - **Deterministic identity**: records live at addresses derived from the
//!   identities they belong to
//! - **Settle before rate change**: Share mint and burn require a
//!   [`control::Settled`] proof
//!
//! # Invariants
//!
//! - Share conservation: `Validator::delegator_shares` equals the Share held
//!   by the delegations bonded to it
//! - Backing: the unbonded pool holds at least as much GovernanceToken as
//!   there is ConsensusToken
//! - Bounded queues: at most `max_*_entries` live entries per queue

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod action;
pub mod config;
pub mod control;
pub mod crypto;
pub mod error;
pub mod model;
pub mod types;
pub mod world;

// Re-exports
pub use action::Action;
pub use config::Params;
pub use error::{Error, Result};
pub use types::{reserved, ActionContext, Address, Amount, Currency};
pub use world::{World, WorldState};
