//! Pure accrual projection: the per-token availability math.

use crate::domain::{Amount, Boost, Timestamp};

/// Inputs assembled by the ledger for one projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualWindow {
    /// End of the accrual window: `now`, or in period-quantized mode the
    /// latest fully-closed period boundary at or before `now`.
    pub accrued_at: Timestamp,
    /// Oracle-reported time-weighted average claim-weight over the window.
    pub integrated_supply: Amount,
    /// Actual custody balance at projection time.
    pub balance: Amount,
}

/// Project the available balance of `boost` through `window.accrued_at`.
///
/// The two accrual policies compose additively over the same window. The
/// clamp applies to the sum of prior available and new accrual, not to the
/// delta alone, so a shrinking custody balance caps previously accrued
/// value too.
pub fn project_available(boost: &Boost, window: &AccrualWindow) -> Amount {
    let delta_secs = window.accrued_at.elapsed_since(boost.last_accrued_at);
    if delta_secs == 0 {
        return boost.available;
    }

    let supply_term = boost
        .rate_multiplier
        .accrued(delta_secs, window.integrated_supply);
    let flat_term = Amount::new(
        boost
            .tokens_per_second
            .raw()
            .saturating_mul(delta_secs as u128),
    );

    let accrued = boost
        .available
        .saturating_add(supply_term)
        .saturating_add(flat_term);
    window.balance.min(accrued)
}
