//! Domain types for the boost ledger.
//!
//! This module provides:
//! - Deterministic fixed-point handling via the RateMultiplier wrapper
//! - Domain primitives: Timestamp, Address, Token, Amount
//! - The per-token Boost record and the draw/settle LiquidationReceipt

pub mod amount;
pub mod boost;
pub mod primitives;
pub mod rate;

pub use amount::Amount;
pub use boost::{Boost, LiquidationReceipt};
pub use primitives::{Address, Timestamp, Token};
pub use rate::{RateError, RateMultiplier, WAD};
