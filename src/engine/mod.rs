//! Deposit and dynasty accounting engine
//!
//! The engine layer ties the ledgers and the registry into a single state
//! machine:
//!
//! - [`StakeEngine`] owns all state and exposes the operation and query
//!   surface. Operations validate fully before mutating, so a rejected call
//!   leaves no partial writes behind.
//! - [`VoteTally`] tracks per-epoch vote participation and justification.
//! - [`SharedEngine`] wraps the engine for use across threads.

pub mod handle;
pub mod transition;
pub mod votes;

pub use handle::SharedEngine;
pub use transition::{EnginePhase, StakeEngine, TransitionOutcome, TransitionSummary};
pub use votes::VoteTally;

use thiserror::Error;

use crate::core::{Dynasty, Epoch, ValidatorIndex};

/// Errors returned by engine operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    /// Deposit amount is zero, below the configured minimum, or scales to
    /// zero units
    #[error("deposit amount is zero or below the minimum stake")]
    InvalidAmount,

    /// Amount exceeds the headroom of the fixed-point representation
    #[error("amount overflows the fixed-point range")]
    AmountOverflow,

    /// Withdrawal address already backs a live validator
    #[error("withdrawal address is already in use")]
    AddressInUse,

    /// Deposits are configured to be rejected during warm-up
    #[error("deposits are not accepted during warm-up")]
    DepositsNotOpen,

    /// No validator record at this index
    #[error("unknown validator index {0}")]
    UnknownValidator(ValidatorIndex),

    /// The validator has been slashed
    #[error("validator is slashed")]
    AlreadySlashed,

    /// The validator already has an exit scheduled
    #[error("logout already scheduled")]
    LogoutAlreadyScheduled,

    /// Requested end dynasty does not leave the mandatory notice period
    #[error("end dynasty {requested} is below the minimum {minimum}")]
    LogoutTooSoon { requested: Dynasty, minimum: Dynasty },

    /// The voter is in neither the current nor the previous dynasty
    #[error("validator is not a member of the current or previous dynasty")]
    NotInDynasty,

    /// The vote does not target the in-progress epoch
    #[error("vote targets epoch {target} but the current epoch is {current}")]
    StaleVote { target: Epoch, current: Epoch },

    /// The validator already voted in this epoch
    #[error("validator already voted in this epoch")]
    DuplicateVote,

    /// A transition was requested before the chain reached the boundary
    #[error("chain height has not reached the next epoch boundary")]
    PrematureTransition,

    /// The scale factor for this epoch has not been computed yet
    #[error("scale factor for epoch {0} is not yet computed")]
    NotYetComputed(Epoch),

    /// Snapshot serialization or deserialization failed
    #[error("snapshot codec failed: {0}")]
    SnapshotCodec(String),
}
