//! Vote participation and justification tallies
//!
//! Stake-weighted, per-epoch bookkeeping for the induction gateway. A vote
//! adds the voter's scaled deposit to the tallies of whichever dynasties the
//! voter belongs to; the epoch's checkpoint is justified once the voted
//! stake reaches the quorum share of both the current and previous dynasty
//! totals. Totals are frozen between boundaries, so tallies compare against
//! stable denominators.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::{Epoch, ScaledWei, ValidatorIndex};
use crate::{QUORUM_DENOMINATOR, QUORUM_NUMERATOR};

/// Votes recorded for a single epoch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EpochVotes {
    /// Validators that have voted this epoch
    voted: HashSet<ValidatorIndex>,
    /// Scaled stake voted by current-dynasty members
    curdyn_voted: ScaledWei,
    /// Scaled stake voted by previous-dynasty members
    prevdyn_voted: ScaledWei,
    /// Whether the epoch's checkpoint reached justification
    justified: bool,
}

/// Per-epoch vote bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteTally {
    epochs: HashMap<Epoch, EpochVotes>,
}

impl VoteTally {
    /// Create an empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a validator already voted in an epoch
    pub fn has_voted(&self, epoch: Epoch, index: ValidatorIndex) -> bool {
        self.epochs
            .get(&epoch)
            .map(|votes| votes.voted.contains(&index))
            .unwrap_or(false)
    }

    /// Scaled stake voted in an epoch, split as (curdyn, prevdyn)
    pub fn voted_stake(&self, epoch: Epoch) -> (ScaledWei, ScaledWei) {
        self.epochs
            .get(&epoch)
            .map(|votes| (votes.curdyn_voted, votes.prevdyn_voted))
            .unwrap_or((0, 0))
    }

    /// Whether an epoch's checkpoint is justified
    pub fn is_justified(&self, epoch: Epoch) -> bool {
        self.epochs
            .get(&epoch)
            .map(|votes| votes.justified)
            .unwrap_or(false)
    }

    /// Record a vote's stake weight toward each dynasty the voter sits in
    pub(crate) fn record(
        &mut self,
        epoch: Epoch,
        index: ValidatorIndex,
        curdyn_stake: Option<ScaledWei>,
        prevdyn_stake: Option<ScaledWei>,
    ) {
        let entry = self.epochs.entry(epoch).or_default();
        entry.voted.insert(index);
        if let Some(stake) = curdyn_stake {
            entry.curdyn_voted = entry.curdyn_voted.saturating_add(stake);
        }
        if let Some(stake) = prevdyn_stake {
            entry.prevdyn_voted = entry.prevdyn_voted.saturating_add(stake);
        }
    }

    /// Mark the epoch justified once voted stake reaches the quorum share of
    /// both dynasty totals. Returns true only on the call that crosses the
    /// threshold.
    pub(crate) fn try_justify(
        &mut self,
        epoch: Epoch,
        total_curdyn: ScaledWei,
        total_prevdyn: ScaledWei,
    ) -> bool {
        let entry = self.epochs.entry(epoch).or_default();
        if entry.justified {
            return false;
        }
        if quorum(entry.curdyn_voted, total_curdyn) && quorum(entry.prevdyn_voted, total_prevdyn) {
            entry.justified = true;
            return true;
        }
        false
    }

    /// Mark an epoch justified without a tally (self-justification while
    /// deposits do not exist)
    pub(crate) fn mark_justified(&mut self, epoch: Epoch) {
        self.epochs.entry(epoch).or_default().justified = true;
    }
}

/// Quorum test: `voted / total >= QUORUM_NUMERATOR / QUORUM_DENOMINATOR`
fn quorum(voted: ScaledWei, total: ScaledWei) -> bool {
    voted.saturating_mul(QUORUM_DENOMINATOR) >= total.saturating_mul(QUORUM_NUMERATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_epoch_queries() {
        let tally = VoteTally::new();
        assert!(!tally.has_voted(0, 0));
        assert_eq!(tally.voted_stake(0), (0, 0));
        assert!(!tally.is_justified(0));
    }

    #[test]
    fn test_record_accumulates_per_dynasty() {
        let mut tally = VoteTally::new();
        tally.record(3, 0, Some(100), Some(100));
        tally.record(3, 1, Some(50), None);

        assert!(tally.has_voted(3, 0));
        assert!(tally.has_voted(3, 1));
        assert!(!tally.has_voted(3, 2));
        assert_eq!(tally.voted_stake(3), (150, 100));
        assert_eq!(tally.voted_stake(4), (0, 0));
    }

    #[test]
    fn test_quorum_boundary_is_two_thirds() {
        // Exactly two thirds passes
        assert!(quorum(2, 3));
        assert!(quorum(200, 300));
        // Just below fails
        assert!(!quorum(199, 300));
        // Zero total is trivially met
        assert!(quorum(0, 0));
    }

    #[test]
    fn test_try_justify_crosses_once() {
        let mut tally = VoteTally::new();
        tally.record(1, 0, Some(100), Some(100));
        assert!(!tally.try_justify(1, 300, 150));

        tally.record(1, 1, Some(100), Some(0));
        assert!(tally.try_justify(1, 300, 150));
        assert!(tally.is_justified(1));

        // Further calls no longer report a crossing
        tally.record(1, 2, Some(100), Some(50));
        assert!(!tally.try_justify(1, 300, 150));
    }

    #[test]
    fn test_mark_justified() {
        let mut tally = VoteTally::new();
        tally.mark_justified(9);
        assert!(tally.is_justified(9));
        assert_eq!(tally.voted_stake(9), (0, 0));
    }
}
