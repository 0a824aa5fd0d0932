//! Engine configuration
//!
//! Economic and timing parameters are governance inputs, not core logic:
//! the engine applies whatever it is constructed with and never changes
//! them afterwards.

use serde::{Deserialize, Serialize};

use super::units::{ScaleFactor, Wei};
use crate::{
    DEFAULT_EPOCH_LENGTH, DEFAULT_EPOCHS_PER_DYNASTY, DEFAULT_MIN_DEPOSIT_WEI,
    DEFAULT_WARM_UP_EPOCHS, GENESIS_SCALE_FACTOR,
};

/// How a premature `new_epoch` call is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionPolicy {
    /// Reject with an error (test and debug deployments)
    Strict,
    /// Skip silently and report that no boundary was crossed (production)
    Lenient,
}

/// How deposits submitted during the warm-up window are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmupDeposits {
    /// Accept; the dynasty lag defers activation past warm-up anyway
    Accept,
    /// Reject until the engine leaves warm-up
    Reject,
}

/// Configuration for the staking engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Blocks per epoch
    pub epoch_length: u64,
    /// Epochs during which dynasty transitions stay inert after genesis
    pub warm_up_epochs: u64,
    /// Epochs per dynasty boundary
    pub epochs_per_dynasty: u64,
    /// Minimum accepted deposit (wei)
    pub min_deposit_wei: Wei,
    /// Scale factor assigned to epoch 0
    pub genesis_scale_factor: ScaleFactor,
    /// Per-epoch multiplier applied while deposits exist
    pub reward_factor: ScaleFactor,
    /// Premature-transition handling
    pub transition_policy: TransitionPolicy,
    /// Warm-up deposit handling
    pub warmup_deposits: WarmupDeposits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epoch_length: DEFAULT_EPOCH_LENGTH,            // 50 blocks
            warm_up_epochs: DEFAULT_WARM_UP_EPOCHS,        // 10 epochs
            epochs_per_dynasty: DEFAULT_EPOCHS_PER_DYNASTY,
            min_deposit_wei: DEFAULT_MIN_DEPOSIT_WEI,      // 1500 tokens
            genesis_scale_factor: ScaleFactor::from_int(GENESIS_SCALE_FACTOR),
            reward_factor: ScaleFactor::one(),             // no interest by default
            transition_policy: TransitionPolicy::Strict,
            warmup_deposits: WarmupDeposits::Accept,
        }
    }
}

impl EngineConfig {
    /// Clamp degenerate values so epoch arithmetic stays well defined
    pub fn normalized(mut self) -> Self {
        self.epoch_length = self.epoch_length.max(1);
        self.epochs_per_dynasty = self.epochs_per_dynasty.max(1);
        if self.genesis_scale_factor.is_zero() {
            self.genesis_scale_factor = ScaleFactor::from_int(GENESIS_SCALE_FACTOR);
        }
        if self.reward_factor.is_zero() {
            self.reward_factor = ScaleFactor::one();
        }
        self
    }
}
