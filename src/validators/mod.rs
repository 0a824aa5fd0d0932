//! Validator records and registry
//!
//! One record per deposited stake, addressed by a dense index assigned at
//! deposit time. Records carry the scaled deposit, the dynasty window the
//! stake is counted in, and logout/slashing state. Indices are never reused,
//! even after slashing.

pub mod registry;

pub use registry::{LogoutStatus, Validator, ValidatorRegistry};
