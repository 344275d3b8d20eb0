//! Unsigned fixed-point rate multiplier for supply-proportional accrual.
//!
//! Stored as an integer scaled by `WAD` (18 fractional decimal digits) so
//! accrual math is deterministic and reproducible bit-for-bit. rust_decimal
//! is used only at the parse boundary for canonical decimal strings.

use crate::domain::Amount;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed-point scale: one whole unit in 18-fractional-digit representation.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Upper bound (exclusive) of the multiplier range, `2.0` in WAD units.
const MAX_RAW: u128 = 2 * WAD;

/// A non-negative fixed-point scalar in `[0, 2)`, applied per second of
/// elapsed time to the beneficiary's integrated claim-weight.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct RateMultiplier(u128);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("invalid decimal value: {0}")]
    InvalidDecimal(String),
    #[error("rate multiplier must be in [0, 2), got {0}")]
    OutOfRange(String),
}

impl RateMultiplier {
    pub const ZERO: RateMultiplier = RateMultiplier(0);

    /// Construct from a raw WAD-scaled value, enforcing the `[0, 2)` range.
    pub fn from_raw(raw: u128) -> Result<Self, RateError> {
        if raw >= MAX_RAW {
            return Err(RateError::OutOfRange(format_wad(raw)));
        }
        Ok(RateMultiplier(raw))
    }

    /// Get the raw WAD-scaled value.
    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Returns true if the multiplier is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Supply-proportional accrual over a window:
    /// `multiplier * delta_secs * weight`, truncated toward zero.
    ///
    /// Saturates to `u128::MAX` on overflow rather than wrapping; the
    /// custody-balance clamp downstream bounds the result either way.
    pub fn accrued(&self, delta_secs: u64, weight: Amount) -> Amount {
        let product = self
            .0
            .checked_mul(delta_secs as u128)
            .and_then(|p| p.checked_mul(weight.raw()));
        match product {
            Some(p) => Amount::new(p / WAD),
            None => Amount::new(u128::MAX),
        }
    }
}

impl FromStr for RateMultiplier {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            Decimal::from_str(s).map_err(|_| RateError::InvalidDecimal(s.to_string()))?;
        if value.is_sign_negative() {
            return Err(RateError::OutOfRange(s.to_string()));
        }
        if value >= Decimal::from(2u64) {
            return Err(RateError::OutOfRange(s.to_string()));
        }
        let wad = Decimal::from_u128(WAD).ok_or_else(|| RateError::InvalidDecimal(s.to_string()))?;
        let scaled = value
            .checked_mul(wad)
            .ok_or_else(|| RateError::InvalidDecimal(s.to_string()))?;
        let raw = scaled
            .trunc()
            .to_u128()
            .ok_or_else(|| RateError::InvalidDecimal(s.to_string()))?;
        RateMultiplier::from_raw(raw)
    }
}

fn format_wad(raw: u128) -> String {
    let int = raw / WAD;
    let frac = raw % WAD;
    if frac == 0 {
        return int.to_string();
    }
    let digits = format!("{:018}", frac);
    format!("{}.{}", int, digits.trim_end_matches('0'))
}

impl fmt::Display for RateMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_wad(self.0))
    }
}

impl TryFrom<String> for RateMultiplier {
    type Error = RateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RateMultiplier> for String {
    fn from(rate: RateMultiplier) -> String {
        rate.to_string()
    }
}
