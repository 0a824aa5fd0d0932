//! Aggregate accounting ledgers
//!
//! Two append-only histories back the engine: the per-epoch scale factor
//! ledger and the per-dynasty stake delta ledger. Both are mutated only by
//! engine operations; external callers get read access.

pub mod dynasty;
pub mod scale;

pub use dynasty::DynastyLedger;
pub use scale::ScaleFactorLedger;
