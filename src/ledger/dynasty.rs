//! Dynasty aggregate accounting
//!
//! Scaled-wei deltas bucketed per dynasty, plus the running current and
//! previous dynasty totals. Deltas accumulate as deposits, logouts and
//! slashings are scheduled; totals move only at dynasty boundaries through
//! `roll_forward`. Consumed buckets stay readable as history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::{Dynasty, ScaledWei};

/// Per-dynasty stake deltas and the two running dynasty totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynastyLedger {
    /// Signed scaled wei entering (+) or leaving (-) each dynasty
    deltas: HashMap<Dynasty, i128>,

    /// Total scaled stake counted in the current dynasty
    total_curdyn: ScaledWei,

    /// Total scaled stake counted in the previous dynasty
    total_prevdyn: ScaledWei,
}

impl DynastyLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Net scaled-wei delta for a dynasty; 0 for untouched dynasties
    pub fn delta(&self, dynasty: Dynasty) -> i128 {
        self.deltas.get(&dynasty).copied().unwrap_or(0)
    }

    /// Accumulate a signed delta into a dynasty bucket
    pub(crate) fn apply_delta(&mut self, dynasty: Dynasty, amount: i128) {
        let entry = self.deltas.entry(dynasty).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Roll totals into `new_dynasty`: the previous total takes the old
    /// current total, then the current total absorbs the new dynasty's
    /// delta bucket. The bucket itself is left in place.
    pub(crate) fn roll_forward(&mut self, new_dynasty: Dynasty) {
        self.total_prevdyn = self.total_curdyn;
        let delta = self.delta(new_dynasty);
        self.total_curdyn = if delta >= 0 {
            self.total_curdyn.saturating_add(delta as u128)
        } else {
            self.total_curdyn.saturating_sub(delta.unsigned_abs())
        };
    }

    /// Total scaled stake in the current dynasty
    pub fn total_curdyn(&self) -> ScaledWei {
        self.total_curdyn
    }

    /// Total scaled stake in the previous dynasty
    pub fn total_prevdyn(&self) -> ScaledWei {
        self.total_prevdyn
    }
}
