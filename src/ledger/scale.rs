//! Per-epoch deposit scale factors
//!
//! Append-only history: one factor per epoch, dense from genesis. The factor
//! for epoch `e` is the factor for `e - 1` multiplied by that transition's
//! reward factor. Entries are never rewritten.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{Epoch, ScaleFactor};

/// Append-only history of per-epoch scale factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleFactorLedger {
    /// Factor per epoch, indexed by epoch number
    factors: Vec<ScaleFactor>,
}

impl ScaleFactorLedger {
    /// Create a ledger holding the genesis factor for epoch 0
    pub fn new(genesis: ScaleFactor) -> Self {
        Self {
            factors: vec![genesis],
        }
    }

    /// Factor for a past or current epoch; `None` if not yet computed
    pub fn factor_at(&self, epoch: Epoch) -> Option<ScaleFactor> {
        usize::try_from(epoch)
            .ok()
            .and_then(|i| self.factors.get(i))
            .copied()
    }

    /// Latest epoch with a computed factor
    pub fn latest_epoch(&self) -> Epoch {
        self.factors.len().saturating_sub(1) as Epoch
    }

    /// Most recent factor
    pub fn latest(&self) -> ScaleFactor {
        self.factors.last().copied().unwrap_or_else(ScaleFactor::one)
    }

    /// Whether the history is well formed (genesis entry present)
    pub fn is_seeded(&self) -> bool {
        !self.factors.is_empty()
    }

    /// Advance to `epoch` by applying `reward_factor` to the latest factor.
    ///
    /// Appends exactly one entry; `epoch` must be the next in sequence. On
    /// mantissa overflow the previous factor is carried unchanged.
    pub(crate) fn advance(&mut self, epoch: Epoch, reward_factor: ScaleFactor) -> ScaleFactor {
        debug_assert_eq!(epoch, self.latest_epoch() + 1);
        let latest = self.latest();
        let next = match latest.checked_mul(reward_factor) {
            Some(factor) => factor,
            None => {
                warn!(epoch, "scale factor mantissa overflow, carrying previous factor");
                latest
            }
        };
        self.factors.push(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_factor_is_epoch_zero() {
        let ledger = ScaleFactorLedger::new(ScaleFactor::from_int(10));
        assert_eq!(ledger.factor_at(0), Some(ScaleFactor::from_int(10)));
        assert_eq!(ledger.latest_epoch(), 0);
    }

    #[test]
    fn test_future_epoch_not_computed() {
        let ledger = ScaleFactorLedger::new(ScaleFactor::one());
        assert_eq!(ledger.factor_at(1), None);
        assert_eq!(ledger.factor_at(100), None);
    }

    #[test]
    fn test_advance_multiplies_previous() {
        let mut ledger = ScaleFactorLedger::new(ScaleFactor::from_int(4));
        let next = ledger.advance(1, ScaleFactor::from_int(3));
        assert_eq!(next, ScaleFactor::from_int(12));
        assert_eq!(ledger.factor_at(1), Some(ScaleFactor::from_int(12)));
        assert_eq!(ledger.latest_epoch(), 1);
    }

    #[test]
    fn test_advance_with_identity_keeps_value() {
        let mut ledger = ScaleFactorLedger::new(ScaleFactor::from_int(7));
        for epoch in 1..=5 {
            ledger.advance(epoch, ScaleFactor::one());
        }
        assert_eq!(ledger.factor_at(5), Some(ScaleFactor::from_int(7)));
        assert_eq!(ledger.latest_epoch(), 5);
    }

    #[test]
    fn test_history_is_immutable() {
        let mut ledger = ScaleFactorLedger::new(ScaleFactor::from_int(2));
        ledger.advance(1, ScaleFactor::from_int(5));
        ledger.advance(2, ScaleFactor::from_int(5));
        assert_eq!(ledger.factor_at(0), Some(ScaleFactor::from_int(2)));
        assert_eq!(ledger.factor_at(1), Some(ScaleFactor::from_int(10)));
    }

    #[test]
    fn test_overflow_carries_previous_factor() {
        let huge = ScaleFactor::from_mantissa(u128::MAX / 2);
        let mut ledger = ScaleFactorLedger::new(huge);
        let next = ledger.advance(1, ScaleFactor::from_int(1_000_000));
        assert_eq!(next, huge);
        assert_eq!(ledger.latest_epoch(), 1);
    }
}
