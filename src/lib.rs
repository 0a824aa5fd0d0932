//! # Dynast
//!
//! Deposit and dynasty accounting for an epoch-based finality gateway.
//!
//! ## Core Features
//! - Validator registry with two-dynasty induction and exit scheduling
//! - Fixed-point deposit scaling with a dense per-epoch factor history
//! - One-dynasty lag between current and previous stake totals
//! - Checkpoint vote tallies with a two-thirds quorum over both dynasties
//! - Slashing that withdraws stake from every future boundary it touches
//! - Strict or lenient handling of premature epoch transitions
//! - Snapshot persistence of the full engine state

pub mod core;
pub mod engine;
pub mod ledger;
pub mod validators;

// Re-exports
pub use core::*;
pub use engine::{
    EnginePhase, SharedEngine, StakeEngine, StakingError, TransitionOutcome, TransitionSummary,
    VoteTally,
};
pub use ledger::{DynastyLedger, ScaleFactorLedger};
pub use validators::{LogoutStatus, Validator, ValidatorRegistry};

// =============================================================================
// PROTOCOL CONSTANTS
// =============================================================================

/// Dynast version
pub const DYNAST_VERSION: &str = "0.2.0";

/// Wei per token (1 token = 10^18 wei)
pub const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// End dynasty assigned to validators with no scheduled exit (10^30,
/// far beyond any reachable dynasty counter)
pub const END_DYNASTY_SENTINEL: u128 = 1_000_000_000_000_000_000_000_000_000_000;

/// Fractional decimal digits carried by a scale factor
pub const FIXED_POINT_DECIMALS: u32 = 10;

/// Fixed-point unit: the mantissa representing 1.0
pub const FIXED_POINT_ONE: u128 = 10u128.pow(FIXED_POINT_DECIMALS);

/// Integer value of the scale factor assigned to epoch 0
pub const GENESIS_SCALE_FACTOR: u64 = 10_000_000_000;

// =============================================================================
// EPOCH AND DYNASTY TIMING
// =============================================================================

/// Blocks per epoch
pub const DEFAULT_EPOCH_LENGTH: u64 = 50;

/// Epochs before dynasty processing activates
pub const DEFAULT_WARM_UP_EPOCHS: u64 = 10;

/// Epochs between dynasty boundaries
pub const DEFAULT_EPOCHS_PER_DYNASTY: u64 = 1;

// =============================================================================
// STAKE REQUIREMENTS
// =============================================================================

/// Minimum accepted deposit (1500 tokens)
pub const DEFAULT_MIN_DEPOSIT_WEI: u128 = 1_500 * WEI_PER_TOKEN;

/// Quorum fraction numerator
pub const QUORUM_NUMERATOR: u128 = 2;

/// Quorum fraction denominator
pub const QUORUM_DENOMINATOR: u128 = 3;
