//! Base units and fixed-point arithmetic for deposit accounting
//!
//! All monetary quantities are integers denominated in wei. Deposits are
//! stored internally in "scaled" units (wei divided by the epoch's scale
//! factor) so that rewards and penalties apply to the whole validator set
//! through a single per-epoch multiplier. No floating point is used
//! anywhere in the accounting path.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::FIXED_POINT_ONE;

/// An epoch number (a fixed-length span of blocks)
pub type Epoch = u64;

/// A dynasty number (a validator-set generation)
pub type Dynasty = u64;

/// A validator index, assigned sequentially at deposit time and never reused
pub type ValidatorIndex = u64;

/// An amount in wei, the smallest indivisible unit
pub type Wei = u128;

/// An amount in scaled deposit units (wei divided by the scale factor)
pub type ScaledWei = u128;

/// Fixed-point multiplier with ten decimal fractional digits.
///
/// The represented value is `mantissa / FIXED_POINT_ONE`. Every operation
/// truncates toward zero; conversions are exact whenever the operands divide
/// evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScaleFactor(u128);

impl ScaleFactor {
    /// The multiplicative identity (1.0)
    pub fn one() -> Self {
        ScaleFactor(FIXED_POINT_ONE)
    }

    /// Build a factor from a raw fixed-point mantissa
    pub fn from_mantissa(mantissa: u128) -> Self {
        ScaleFactor(mantissa)
    }

    /// Build a factor from a whole-number value
    pub fn from_int(value: u64) -> Self {
        ScaleFactor(value as u128 * FIXED_POINT_ONE)
    }

    /// Raw fixed-point mantissa
    pub fn mantissa(&self) -> u128 {
        self.0
    }

    /// Whether the factor represents exactly zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiply two factors, truncating toward zero.
    ///
    /// Computed as `q * rhs + (r * rhs) / FIXED_POINT_ONE` with
    /// `q = mantissa / FIXED_POINT_ONE` and `r = mantissa % FIXED_POINT_ONE`,
    /// which keeps intermediate products inside 128 bits for any realistic
    /// factor history. Returns `None` on overflow.
    pub fn checked_mul(self, rhs: ScaleFactor) -> Option<ScaleFactor> {
        let q = self.0 / FIXED_POINT_ONE;
        let r = self.0 % FIXED_POINT_ONE;

        let high = q.checked_mul(rhs.0)?;
        let low = r.checked_mul(rhs.0)? / FIXED_POINT_ONE;
        Some(ScaleFactor(high.checked_add(low)?))
    }

    /// Convert a wei amount into scaled units: `floor(amount / factor)`.
    ///
    /// Returns `None` if the factor is zero or the conversion overflows.
    pub fn wei_to_scaled(self, amount: Wei) -> Option<ScaledWei> {
        if self.0 == 0 {
            return None;
        }
        let q = amount / self.0;
        let r = amount % self.0;

        let high = q.checked_mul(FIXED_POINT_ONE)?;
        let low = r.checked_mul(FIXED_POINT_ONE)? / self.0;
        high.checked_add(low)
    }

    /// Convert scaled units back into wei: `floor(scaled * factor)`.
    ///
    /// Saturates at `u128::MAX`; read-only conversions never fail.
    pub fn scaled_to_wei(self, amount: ScaledWei) -> Wei {
        let q = amount / FIXED_POINT_ONE;
        let r = amount % FIXED_POINT_ONE;

        let high = q.saturating_mul(self.0);
        let low = r.saturating_mul(self.0) / FIXED_POINT_ONE;
        high.saturating_add(low)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:010}", self.0 / FIXED_POINT_ONE, self.0 % FIXED_POINT_ONE)
    }
}

/// A 20-byte withdrawal address, displayed as 0x-prefixed lowercase hex
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Wrap raw address bytes
    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Derive an address from an uncompressed public key: the low 20 bytes
    /// of the Keccak-256 digest
    pub fn from_pubkey_bytes(pubkey: &[u8]) -> Self {
        let digest = Keccak256::digest(pubkey);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..32]);
        Address(bytes)
    }

    /// Parse a hex address, with or without the 0x prefix
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s).ok()?;
        let bytes: [u8; 20] = raw.try_into().ok()?;
        Some(Address(bytes))
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Calculate the epoch containing a block height
pub fn height_to_epoch(height: u64, epoch_length: u64) -> Epoch {
    height / epoch_length.max(1)
}

/// First block height of an epoch
pub fn epoch_first_height(epoch: Epoch, epoch_length: u64) -> u64 {
    epoch.saturating_mul(epoch_length)
}
