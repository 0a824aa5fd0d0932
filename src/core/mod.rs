//! Core types for the deposit accounting engine
//!
//! # Units
//! Wei is the smallest indivisible unit; every deposit is stored internally
//! in scaled units obtained through the epoch's fixed-point scale factor.
//! Fixed-point carries ten decimal fractional digits and truncates toward
//! zero, so conversions are exact whenever the operands divide evenly.
//!
//! # Identities
//! Validators are addressed by a dense, monotonically assigned index.
//! Withdrawal addresses are 20-byte identities derived from the Keccak-256
//! digest of an uncompressed public key, displayed as 0x-prefixed hex.

pub mod config;
pub mod units;
pub mod vote;

pub use config::{EngineConfig, TransitionPolicy, WarmupDeposits};
pub use units::{
    epoch_first_height, height_to_epoch, Address, Dynasty, Epoch, ScaleFactor, ScaledWei,
    ValidatorIndex, Wei,
};
pub use vote::{CheckpointHash, Vote};
