//! Per-token boost record and the receipt binding a draw to its settlement.

use crate::domain::{Address, Amount, RateMultiplier, Timestamp, Token};
use serde::{Deserialize, Serialize};

/// Accrual state for one boosted token.
///
/// `available` is the amount currently authorized for withdrawal by the
/// liquidation pair. It is recomputed forward in time on every read or
/// mutation and never exceeds the actual custody balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boost {
    /// Sole counterparty authorized to draw this token down.
    pub liquidation_pair: Address,
    /// Supply-proportional accrual rate, applied per second of elapsed time.
    pub rate_multiplier: RateMultiplier,
    /// Flat accrual rate in token units per second.
    pub tokens_per_second: Amount,
    /// Currently authorized withdrawal ceiling.
    pub available: Amount,
    /// Timestamp through which `available` has already been computed.
    pub last_accrued_at: Timestamp,
}

/// Opaque receipt returned by a liquidation draw.
///
/// Settlement presents the receipt back; the ledger recomputes `key` and
/// rejects a receipt whose fields were altered, then checks the caller is
/// the pair registered for `token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidationReceipt {
    /// Token released by the draw.
    pub token: Token,
    /// Amount released.
    pub amount_out: Amount,
    /// Accrual timestamp committed by the draw.
    pub accrued_at: Timestamp,
    /// Integrity key over the other fields.
    pub key: String,
}

impl LiquidationReceipt {
    /// Create a receipt for a completed draw, computing its key.
    pub fn new(token: Token, amount_out: Amount, accrued_at: Timestamp) -> Self {
        let key = Self::compute_key(&token, amount_out, accrued_at);
        Self {
            token,
            amount_out,
            accrued_at,
            key,
        }
    }

    /// Deterministic key over the receipt fields.
    ///
    /// Truncating SHA-256 to 128 bits keeps the key short while leaving
    /// ~2^64 collision resistance via the birthday bound, far beyond the
    /// draw volume a single ledger sees.
    pub fn compute_key(token: &Token, amount_out: Amount, accrued_at: Timestamp) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update((token.as_str().len() as u32).to_le_bytes());
        hasher.update(token.as_str().as_bytes());
        hasher.update(amount_out.raw().to_le_bytes());
        hasher.update(accrued_at.as_secs().to_le_bytes());

        let hash = hasher.finalize();
        format!("draw:{}", hex::encode(&hash[..16]))
    }

    /// Returns true if `key` still matches the receipt fields.
    pub fn is_intact(&self) -> bool {
        self.key == Self::compute_key(&self.token, self.amount_out, self.accrued_at)
    }
}
