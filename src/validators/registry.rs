//! Validator Registry
//!
//! Maintains the authoritative arena of validator records. Indices are
//! assigned sequentially at deposit time and never reused; records are never
//! removed, only marked. All mutation goes through engine operations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::core::{Address, Dynasty, ScaledWei, ValidatorIndex};
use crate::END_DYNASTY_SENTINEL;

/// Logout state of a validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogoutStatus {
    /// No logout requested; the end dynasty reads as the sentinel
    Active,
    /// Exit scheduled: the first dynasty in which the validator is no
    /// longer counted
    ScheduledExit(Dynasty),
}

impl LogoutStatus {
    /// End dynasty in sentinel form: `10^30` while no logout is scheduled
    pub fn end_dynasty(&self) -> u128 {
        match self {
            LogoutStatus::Active => END_DYNASTY_SENTINEL,
            LogoutStatus::ScheduledExit(dynasty) => *dynasty as u128,
        }
    }

    /// Scheduled exit dynasty, if any
    pub fn scheduled(&self) -> Option<Dynasty> {
        match self {
            LogoutStatus::Active => None,
            LogoutStatus::ScheduledExit(dynasty) => Some(*dynasty),
        }
    }
}

/// A validator record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    /// Arena index, assigned at deposit time
    pub index: ValidatorIndex,
    /// Identity to which funds return on withdrawal
    pub withdrawal_addr: Address,
    /// Deposit in scaled units
    pub deposit: ScaledWei,
    /// First dynasty in which the validator is counted active
    pub start_dynasty: Dynasty,
    /// Logout state; `Active` until a logout is requested
    pub logout: LogoutStatus,
    /// Whether the validator has been slashed
    pub is_slashed: bool,
    /// Current-dynasty total snapshotted when the exit boundary passes;
    /// 0 while active or never logged out
    pub total_deposits_at_logout: ScaledWei,
}

impl Validator {
    fn new(
        index: ValidatorIndex,
        withdrawal_addr: Address,
        deposit: ScaledWei,
        start_dynasty: Dynasty,
    ) -> Self {
        Self {
            index,
            withdrawal_addr,
            deposit,
            start_dynasty,
            logout: LogoutStatus::Active,
            is_slashed: false,
            total_deposits_at_logout: 0,
        }
    }

    /// End dynasty in sentinel form
    pub fn end_dynasty(&self) -> u128 {
        self.logout.end_dynasty()
    }

    /// Whether the validator's stake is counted in `dynasty`
    pub fn is_in_dynasty(&self, dynasty: Dynasty) -> bool {
        self.start_dynasty <= dynasty && (dynasty as u128) < self.end_dynasty()
    }
}

/// Arena of validator records with address and exit bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorRegistry {
    /// Records in index order; never removed
    validators: Vec<Validator>,
    /// Withdrawal address to index, for live validators only
    by_addr: HashMap<Address, ValidatorIndex>,
    /// Indices awaiting their logout snapshot, keyed by exit dynasty
    exit_queue: BTreeMap<Dynasty, Vec<ValidatorIndex>>,
}

impl ValidatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next deposit will receive
    pub fn next_validator_index(&self) -> ValidatorIndex {
        self.validators.len() as ValidatorIndex
    }

    /// Number of records ever created
    pub fn validator_count(&self) -> u64 {
        self.validators.len() as u64
    }

    /// Get a record by index
    pub fn get(&self, index: ValidatorIndex) -> Option<&Validator> {
        usize::try_from(index).ok().and_then(|i| self.validators.get(i))
    }

    pub(crate) fn get_mut(&mut self, index: ValidatorIndex) -> Option<&mut Validator> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.validators.get_mut(i))
    }

    /// Whether an address currently backs a live validator
    pub fn address_in_use(&self, addr: &Address) -> bool {
        self.by_addr.contains_key(addr)
    }

    /// Index bound to a withdrawal address, if the validator is live
    pub fn index_for_addr(&self, addr: &Address) -> Option<ValidatorIndex> {
        self.by_addr.get(addr).copied()
    }

    /// Iterate over all records in index order
    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter()
    }

    /// Append a new record and bind its address. The caller checks that the
    /// address is free.
    pub(crate) fn insert(
        &mut self,
        withdrawal_addr: Address,
        deposit: ScaledWei,
        start_dynasty: Dynasty,
    ) -> ValidatorIndex {
        let index = self.next_validator_index();
        self.validators
            .push(Validator::new(index, withdrawal_addr, deposit, start_dynasty));
        self.by_addr.insert(withdrawal_addr, index);
        index
    }

    /// Mark an exit and enqueue the index for its boundary snapshot
    pub(crate) fn schedule_exit(&mut self, index: ValidatorIndex, end_dynasty: Dynasty) {
        if let Some(validator) = self.get_mut(index) {
            validator.logout = LogoutStatus::ScheduledExit(end_dynasty);
            self.exit_queue.entry(end_dynasty).or_default().push(index);
        }
    }

    /// Release the address binding of a validator (slash or completed exit)
    pub(crate) fn release_address(&mut self, index: ValidatorIndex) {
        if let Some(addr) = self.get(index).map(|v| v.withdrawal_addr) {
            if self.by_addr.get(&addr) == Some(&index) {
                self.by_addr.remove(&addr);
            }
        }
    }

    /// Drain the indices whose exit boundary is `dynasty`
    pub(crate) fn take_exits_at(&mut self, dynasty: Dynasty) -> Vec<ValidatorIndex> {
        self.exit_queue.remove(&dynasty).unwrap_or_default()
    }
}
