//! Epoch and dynasty transition state machine
//!
//! [`StakeEngine`] owns the validator registry, both ledgers and the vote
//! tallies, and is the only mutation path into any of them. Operations are
//! sequential over `&mut self` and atomic: every precondition is checked
//! before the first write, so a rejected call leaves the state exactly as it
//! found it.
//!
//! The lifecycle is driven from outside through [`StakeEngine::observe_height`]
//! and [`StakeEngine::new_epoch`]. A transition closes the previous epoch,
//! optionally crosses a dynasty boundary (only when the closing checkpoint
//! was justified), settles scheduled exits at that boundary, and extends the
//! scale factor history by exactly one entry.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{
    epoch_first_height, Address, Dynasty, EngineConfig, Epoch, ScaleFactor, ScaledWei,
    TransitionPolicy, ValidatorIndex, Vote, WarmupDeposits, Wei,
};
use crate::ledger::{DynastyLedger, ScaleFactorLedger};
use crate::validators::{LogoutStatus, Validator, ValidatorRegistry};

use super::votes::VoteTally;
use super::StakingError;

/// Lifecycle phase of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Dynasty processing is inert; only the epoch counter moves
    WarmUp,

    /// Full transition processing
    Active,
}

/// Result of a transition request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOutcome {
    /// The epoch advanced
    Advanced(TransitionSummary),

    /// No boundary was crossed and nothing changed (lenient policy only)
    NotAtBoundary,
}

impl TransitionOutcome {
    /// The summary of an applied transition, if one was applied
    pub fn summary(&self) -> Option<&TransitionSummary> {
        match self {
            TransitionOutcome::Advanced(summary) => Some(summary),
            TransitionOutcome::NotAtBoundary => None,
        }
    }
}

/// Counters reported after an applied transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSummary {
    /// Epoch counter after the transition
    pub epoch: Epoch,
    /// Dynasty counter after the transition
    pub dynasty: Dynasty,
    /// Whether a dynasty boundary was crossed
    pub dynasty_advanced: bool,
    /// Scale factor assigned to the new epoch
    pub scale_factor: ScaleFactor,
    /// Scaled current-dynasty total after the transition
    pub total_curdyn: ScaledWei,
    /// Scaled previous-dynasty total after the transition
    pub total_prevdyn: ScaledWei,
}

/// The deposit and dynasty accounting engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeEngine {
    config: EngineConfig,
    phase: EnginePhase,
    epoch: Epoch,
    dynasty: Dynasty,
    chain_height: u64,
    registry: ValidatorRegistry,
    scale: ScaleFactorLedger,
    dynasties: DynastyLedger,
    votes: VoteTally,
    total_slashed: ScaledWei,
}

impl StakeEngine {
    /// Create an engine at epoch 0, dynasty 0, with empty ledgers
    pub fn new(config: EngineConfig) -> Self {
        let config = config.normalized();
        let phase = if config.warm_up_epochs == 0 {
            EnginePhase::Active
        } else {
            EnginePhase::WarmUp
        };
        let scale = ScaleFactorLedger::new(config.genesis_scale_factor);
        info!(
            epoch_length = config.epoch_length,
            warm_up_epochs = config.warm_up_epochs,
            epochs_per_dynasty = config.epochs_per_dynasty,
            "engine initialized"
        );
        Self {
            config,
            phase,
            epoch: 0,
            dynasty: 0,
            chain_height: 0,
            registry: ValidatorRegistry::new(),
            scale,
            dynasties: DynastyLedger::new(),
            votes: VoteTally::new(),
            total_slashed: 0,
        }
    }

    // ---- operations ----

    /// Record the externally observed chain height. Heights never move
    /// backwards.
    pub fn observe_height(&mut self, height: u64) {
        self.chain_height = self.chain_height.max(height);
    }

    /// Register a deposit and schedule the validator's induction two
    /// dynasties out. Returns the assigned validator index.
    pub fn deposit(
        &mut self,
        withdrawal_addr: Address,
        amount: Wei,
    ) -> Result<ValidatorIndex, StakingError> {
        if amount == 0 || amount < self.config.min_deposit_wei {
            return Err(StakingError::InvalidAmount);
        }
        if self.phase == EnginePhase::WarmUp
            && self.config.warmup_deposits == WarmupDeposits::Reject
        {
            return Err(StakingError::DepositsNotOpen);
        }
        if self.registry.address_in_use(&withdrawal_addr) {
            return Err(StakingError::AddressInUse);
        }
        let factor = self
            .scale
            .factor_at(self.epoch)
            .ok_or(StakingError::NotYetComputed(self.epoch))?;
        let scaled = factor
            .wei_to_scaled(amount)
            .ok_or(StakingError::AmountOverflow)?;
        if scaled == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let delta = i128::try_from(scaled).map_err(|_| StakingError::AmountOverflow)?;

        let start_dynasty = self.dynasty.saturating_add(2);
        let index = self.registry.insert(withdrawal_addr, scaled, start_dynasty);
        self.dynasties.apply_delta(start_dynasty, delta);

        debug!(
            index,
            addr = %withdrawal_addr,
            amount = %amount,
            scaled = %scaled,
            start_dynasty,
            "deposit accepted"
        );
        Ok(index)
    }

    /// Schedule a voluntary exit at `end_dynasty`. The requested boundary
    /// must leave at least one full dynasty of notice and cannot precede the
    /// validator's own induction.
    pub fn logout(
        &mut self,
        index: ValidatorIndex,
        end_dynasty: Dynasty,
    ) -> Result<(), StakingError> {
        let (deposit, minimum) = {
            let validator = self
                .registry
                .get(index)
                .ok_or(StakingError::UnknownValidator(index))?;
            if validator.is_slashed {
                return Err(StakingError::AlreadySlashed);
            }
            if validator.logout.scheduled().is_some() {
                return Err(StakingError::LogoutAlreadyScheduled);
            }
            let minimum = self
                .dynasty
                .saturating_add(2)
                .max(validator.start_dynasty.saturating_add(1));
            (validator.deposit, minimum)
        };
        if end_dynasty < minimum {
            return Err(StakingError::LogoutTooSoon {
                requested: end_dynasty,
                minimum,
            });
        }
        let delta = i128::try_from(deposit).map_err(|_| StakingError::AmountOverflow)?;

        self.registry.schedule_exit(index, end_dynasty);
        self.dynasties.apply_delta(end_dynasty, -delta);

        debug!(index, end_dynasty, "logout scheduled");
        Ok(())
    }

    /// Slash a validator: mark the record, release its address for reuse and
    /// withdraw its stake from every dynasty total it would still count in.
    /// Already slashed validators are left untouched.
    pub fn slash(&mut self, index: ValidatorIndex) -> Result<(), StakingError> {
        let (deposit, start_dynasty, logout) = {
            let validator = self
                .registry
                .get(index)
                .ok_or(StakingError::UnknownValidator(index))?;
            if validator.is_slashed {
                return Ok(());
            }
            (validator.deposit, validator.start_dynasty, validator.logout)
        };
        let delta = i128::try_from(deposit).map_err(|_| StakingError::AmountOverflow)?;

        if let Some(validator) = self.registry.get_mut(index) {
            validator.is_slashed = true;
        }
        self.registry.release_address(index);
        self.total_slashed = self.total_slashed.saturating_add(deposit);

        let next_boundary = self.dynasty.saturating_add(1);
        if start_dynasty > self.dynasty {
            // Induction still pending: cancel it, along with any exit
            // already scheduled against it
            self.dynasties.apply_delta(start_dynasty, -delta);
            if let LogoutStatus::ScheduledExit(exit) = logout {
                self.dynasties.apply_delta(exit, delta);
            }
        } else {
            match logout {
                LogoutStatus::Active => {
                    self.dynasties.apply_delta(next_boundary, -delta);
                }
                LogoutStatus::ScheduledExit(exit) if exit > next_boundary => {
                    // Pull the exit forward to the next boundary
                    self.dynasties.apply_delta(exit, delta);
                    self.dynasties.apply_delta(next_boundary, -delta);
                }
                LogoutStatus::ScheduledExit(_) => {}
            }
        }

        info!(index, forfeited = %deposit, "validator slashed");
        Ok(())
    }

    /// Record a vote for the current epoch's checkpoint, weighted by the
    /// voter's scaled deposit in each dynasty it belongs to.
    pub fn vote(&mut self, vote: &Vote) -> Result<(), StakingError> {
        let index = vote.validator_index;
        let (deposit, in_cur, in_prev) = {
            let validator = self
                .registry
                .get(index)
                .ok_or(StakingError::UnknownValidator(index))?;
            if validator.is_slashed {
                return Err(StakingError::AlreadySlashed);
            }
            let in_cur = validator.is_in_dynasty(self.dynasty);
            let in_prev = self.dynasty > 0 && validator.is_in_dynasty(self.dynasty - 1);
            (validator.deposit, in_cur, in_prev)
        };
        if vote.target_epoch != self.epoch {
            return Err(StakingError::StaleVote {
                target: vote.target_epoch,
                current: self.epoch,
            });
        }
        if !in_cur && !in_prev {
            return Err(StakingError::NotInDynasty);
        }
        if self.votes.has_voted(self.epoch, index) {
            return Err(StakingError::DuplicateVote);
        }

        self.votes.record(
            self.epoch,
            index,
            in_cur.then_some(deposit),
            in_prev.then_some(deposit),
        );
        if self.votes.try_justify(
            self.epoch,
            self.dynasties.total_curdyn(),
            self.dynasties.total_prevdyn(),
        ) {
            debug!(epoch = self.epoch, "checkpoint justified by vote quorum");
        }
        debug!(index, epoch = self.epoch, "vote recorded");
        Ok(())
    }

    /// Close the current epoch and open the next one. Only legal once the
    /// observed chain height has crossed the next epoch boundary; before
    /// that the call fails under [`TransitionPolicy::Strict`] and is skipped
    /// under [`TransitionPolicy::Lenient`].
    pub fn new_epoch(&mut self) -> Result<TransitionOutcome, StakingError> {
        if !self.boundary_reached() {
            return match self.config.transition_policy {
                TransitionPolicy::Strict => Err(StakingError::PrematureTransition),
                TransitionPolicy::Lenient => {
                    warn!(
                        epoch = self.epoch,
                        height = self.chain_height,
                        "epoch boundary not reached, transition skipped"
                    );
                    Ok(TransitionOutcome::NotAtBoundary)
                }
            };
        }

        // Snapshotted before any counter moves: both the justification gate
        // and the interest gate read the closing epoch's view
        let deposits_existed = self.deposits_exist();

        self.epoch += 1;
        if self.phase == EnginePhase::WarmUp && self.epoch > self.config.warm_up_epochs {
            self.phase = EnginePhase::Active;
            info!(epoch = self.epoch, "warm-up complete, dynasty processing active");
        }

        let mut dynasty_advanced = false;
        if self.phase == EnginePhase::Active {
            let closing = self.epoch - 1;
            // While deposits do not exist there is no stake to gate on, and
            // the closing checkpoint justifies itself
            if !deposits_existed && !self.votes.is_justified(closing) {
                self.votes.mark_justified(closing);
            }
            let since_warm_up = self.epoch.saturating_sub(self.config.warm_up_epochs);
            let at_dynasty_boundary = since_warm_up % self.config.epochs_per_dynasty == 0;
            if at_dynasty_boundary && self.votes.is_justified(closing) {
                self.dynasty += 1;
                self.dynasties.roll_forward(self.dynasty);
                self.settle_exits_at(self.dynasty);
                dynasty_advanced = true;
            }
        }

        // The factor history stays dense: epochs without deposits carry the
        // previous factor forward unchanged
        let reward = if deposits_existed {
            self.config.reward_factor
        } else {
            ScaleFactor::one()
        };
        let scale_factor = self.scale.advance(self.epoch, reward);

        let summary = TransitionSummary {
            epoch: self.epoch,
            dynasty: self.dynasty,
            dynasty_advanced,
            scale_factor,
            total_curdyn: self.dynasties.total_curdyn(),
            total_prevdyn: self.dynasties.total_prevdyn(),
        };
        info!(
            epoch = summary.epoch,
            dynasty = summary.dynasty,
            dynasty_advanced,
            scale_factor = %summary.scale_factor,
            total_curdyn = %summary.total_curdyn,
            total_prevdyn = %summary.total_prevdyn,
            "epoch transition applied"
        );
        Ok(TransitionOutcome::Advanced(summary))
    }

    /// Finalize the exits queued for a freshly entered dynasty: snapshot the
    /// post-boundary total and release each address. Slashed validators were
    /// settled at slash time and are skipped.
    fn settle_exits_at(&mut self, dynasty: Dynasty) {
        let exits = self.registry.take_exits_at(dynasty);
        if exits.is_empty() {
            return;
        }
        let total = self.dynasties.total_curdyn();
        for index in exits {
            self.registry.release_address(index);
            if let Some(validator) = self.registry.get_mut(index) {
                if !validator.is_slashed {
                    validator.total_deposits_at_logout = total;
                    debug!(index, dynasty, "logout finalized");
                }
            }
        }
    }

    // ---- queries ----

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Current epoch counter
    pub fn current_epoch(&self) -> Epoch {
        self.epoch
    }

    /// Current dynasty counter
    pub fn current_dynasty(&self) -> Dynasty {
        self.dynasty
    }

    /// Highest chain height observed so far
    pub fn chain_height(&self) -> u64 {
        self.chain_height
    }

    /// Whether the observed height allows the next transition
    pub fn boundary_reached(&self) -> bool {
        let next = self.epoch.saturating_add(1);
        self.chain_height >= epoch_first_height(next, self.config.epoch_length)
    }

    /// Index the next deposit will be assigned
    pub fn next_validator_index(&self) -> ValidatorIndex {
        self.registry.next_validator_index()
    }

    /// Number of validator records, including exited and slashed ones
    pub fn validator_count(&self) -> u64 {
        self.registry.validator_count()
    }

    /// Full validator record
    pub fn validator(&self, index: ValidatorIndex) -> Result<&Validator, StakingError> {
        self.registry
            .get(index)
            .ok_or(StakingError::UnknownValidator(index))
    }

    /// A validator's deposit in scaled units
    pub fn validator_deposit(&self, index: ValidatorIndex) -> Result<ScaledWei, StakingError> {
        Ok(self.validator(index)?.deposit)
    }

    /// A validator's deposit converted back to wei at the current scale
    /// factor
    pub fn validator_deposit_in_wei(&self, index: ValidatorIndex) -> Result<Wei, StakingError> {
        let deposit = self.validator(index)?.deposit;
        Ok(self.scale.latest().scaled_to_wei(deposit))
    }

    /// A validator's withdrawal address
    pub fn validator_withdrawal_addr(
        &self,
        index: ValidatorIndex,
    ) -> Result<Address, StakingError> {
        Ok(self.validator(index)?.withdrawal_addr)
    }

    /// The dynasty a validator is first counted active in
    pub fn validator_start_dynasty(
        &self,
        index: ValidatorIndex,
    ) -> Result<Dynasty, StakingError> {
        Ok(self.validator(index)?.start_dynasty)
    }

    /// A validator's end dynasty in sentinel form: the far-future sentinel
    /// until an exit is scheduled
    pub fn validator_end_dynasty(&self, index: ValidatorIndex) -> Result<u128, StakingError> {
        Ok(self.validator(index)?.end_dynasty())
    }

    /// The scheduled exit boundary, if any
    pub fn validator_scheduled_exit(
        &self,
        index: ValidatorIndex,
    ) -> Result<Option<Dynasty>, StakingError> {
        Ok(self.validator(index)?.logout.scheduled())
    }

    /// Whether a validator has been slashed
    pub fn validator_is_slashed(&self, index: ValidatorIndex) -> Result<bool, StakingError> {
        Ok(self.validator(index)?.is_slashed)
    }

    /// The current-dynasty total snapshotted when the validator's exit
    /// boundary passed; 0 until then
    pub fn validator_total_deposits_at_logout(
        &self,
        index: ValidatorIndex,
    ) -> Result<ScaledWei, StakingError> {
        Ok(self.validator(index)?.total_deposits_at_logout)
    }

    /// The scale factor recorded for an epoch
    pub fn deposit_scale_factor(&self, epoch: Epoch) -> Result<ScaleFactor, StakingError> {
        self.scale
            .factor_at(epoch)
            .ok_or(StakingError::NotYetComputed(epoch))
    }

    /// Net scheduled stake change for a dynasty boundary
    pub fn dynasty_wei_delta(&self, dynasty: Dynasty) -> i128 {
        self.dynasties.delta(dynasty)
    }

    /// Scaled stake counted in the current dynasty
    pub fn total_curdyn_deposits(&self) -> ScaledWei {
        self.dynasties.total_curdyn()
    }

    /// Scaled stake counted in the previous dynasty
    pub fn total_prevdyn_deposits(&self) -> ScaledWei {
        self.dynasties.total_prevdyn()
    }

    /// Current-dynasty stake converted to wei at the current scale factor
    pub fn total_curdyn_deposits_in_wei(&self) -> Wei {
        self.scale.latest().scaled_to_wei(self.dynasties.total_curdyn())
    }

    /// Previous-dynasty stake converted to wei at the current scale factor
    pub fn total_prevdyn_deposits_in_wei(&self) -> Wei {
        self.scale.latest().scaled_to_wei(self.dynasties.total_prevdyn())
    }

    /// Cumulative scaled stake forfeited through slashing
    pub fn total_slashed(&self) -> ScaledWei {
        self.total_slashed
    }

    /// Both dynasty totals are populated. While false, checkpoints justify
    /// themselves and no interest accrues.
    pub fn deposits_exist(&self) -> bool {
        self.dynasties.total_curdyn() > 0 && self.dynasties.total_prevdyn() > 0
    }

    /// Whether a validator voted in an epoch
    pub fn has_voted(&self, epoch: Epoch, index: ValidatorIndex) -> bool {
        self.votes.has_voted(epoch, index)
    }

    /// Scaled stake voted in an epoch, split as (curdyn, prevdyn)
    pub fn voted_stake(&self, epoch: Epoch) -> (ScaledWei, ScaledWei) {
        self.votes.voted_stake(epoch)
    }

    /// Whether an epoch's checkpoint is justified
    pub fn is_justified(&self, epoch: Epoch) -> bool {
        self.votes.is_justified(epoch)
    }

    // ---- persistence ----

    /// Serialize the full engine state
    pub fn snapshot(&self) -> Result<Vec<u8>, StakingError> {
        bincode::serialize(self).map_err(|e| StakingError::SnapshotCodec(e.to_string()))
    }

    /// Rebuild an engine from snapshot bytes
    pub fn restore(bytes: &[u8]) -> Result<Self, StakingError> {
        let engine: StakeEngine =
            bincode::deserialize(bytes).map_err(|e| StakingError::SnapshotCodec(e.to_string()))?;
        if !engine.scale.is_seeded() {
            return Err(StakingError::SnapshotCodec(
                "snapshot is missing the scale factor history".into(),
            ));
        }
        Ok(engine)
    }
}

impl Default for StakeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
