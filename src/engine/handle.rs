//! Thread-safe engine handle
//!
//! Wraps a [`StakeEngine`] behind an `Arc<RwLock>` so gateway frontends
//! (block import, vote ingest, RPC queries) can share one instance.
//! Operations take the write lock for the duration of a single call, which
//! preserves the engine's sequential semantics.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{Address, Dynasty, EngineConfig, Epoch, ScaleFactor, ScaledWei, ValidatorIndex, Vote, Wei};
use crate::validators::Validator;

use super::transition::{EnginePhase, StakeEngine, TransitionOutcome};
use super::StakingError;

/// Thread-safe deposit engine wrapper
pub struct SharedEngine {
    inner: Arc<RwLock<StakeEngine>>,
}

impl SharedEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StakeEngine::new(config))),
        }
    }

    pub fn from_engine(engine: StakeEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn observe_height(&self, height: u64) {
        self.inner.write().observe_height(height);
    }

    pub fn deposit(&self, withdrawal_addr: Address, amount: Wei) -> Result<ValidatorIndex, StakingError> {
        self.inner.write().deposit(withdrawal_addr, amount)
    }

    pub fn logout(&self, index: ValidatorIndex, end_dynasty: Dynasty) -> Result<(), StakingError> {
        self.inner.write().logout(index, end_dynasty)
    }

    pub fn slash(&self, index: ValidatorIndex) -> Result<(), StakingError> {
        self.inner.write().slash(index)
    }

    pub fn vote(&self, vote: &Vote) -> Result<(), StakingError> {
        self.inner.write().vote(vote)
    }

    pub fn new_epoch(&self) -> Result<TransitionOutcome, StakingError> {
        self.inner.write().new_epoch()
    }

    pub fn current_epoch(&self) -> Epoch {
        self.inner.read().current_epoch()
    }

    pub fn current_dynasty(&self) -> Dynasty {
        self.inner.read().current_dynasty()
    }

    pub fn phase(&self) -> EnginePhase {
        self.inner.read().phase()
    }

    pub fn chain_height(&self) -> u64 {
        self.inner.read().chain_height()
    }

    pub fn validator_count(&self) -> u64 {
        self.inner.read().validator_count()
    }

    pub fn validator(&self, index: ValidatorIndex) -> Result<Validator, StakingError> {
        self.inner.read().validator(index).cloned()
    }

    pub fn validator_deposit(&self, index: ValidatorIndex) -> Result<ScaledWei, StakingError> {
        self.inner.read().validator_deposit(index)
    }

    pub fn validator_deposit_in_wei(&self, index: ValidatorIndex) -> Result<Wei, StakingError> {
        self.inner.read().validator_deposit_in_wei(index)
    }

    pub fn deposit_scale_factor(&self, epoch: Epoch) -> Result<ScaleFactor, StakingError> {
        self.inner.read().deposit_scale_factor(epoch)
    }

    pub fn total_curdyn_deposits(&self) -> ScaledWei {
        self.inner.read().total_curdyn_deposits()
    }

    pub fn total_prevdyn_deposits(&self) -> ScaledWei {
        self.inner.read().total_prevdyn_deposits()
    }

    pub fn total_curdyn_deposits_in_wei(&self) -> Wei {
        self.inner.read().total_curdyn_deposits_in_wei()
    }

    pub fn total_prevdyn_deposits_in_wei(&self) -> Wei {
        self.inner.read().total_prevdyn_deposits_in_wei()
    }

    pub fn total_slashed(&self) -> ScaledWei {
        self.inner.read().total_slashed()
    }

    pub fn deposits_exist(&self) -> bool {
        self.inner.read().deposits_exist()
    }

    pub fn is_justified(&self, epoch: Epoch) -> bool {
        self.inner.read().is_justified(epoch)
    }

    pub fn snapshot(&self) -> Result<Vec<u8>, StakingError> {
        self.inner.read().snapshot()
    }
}

impl Clone for SharedEngine {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
