//! Accrual projection and the boost ledger.

use crate::domain::{Address, Amount, RateMultiplier, Timestamp, Token};
use serde::Serialize;

pub mod accrual;
pub mod ledger;

pub use accrual::{project_available, AccrualWindow};
pub use ledger::{BoostLedger, LedgerError};

/// Audit event appended by every mutating ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LedgerEvent {
    /// A counterparty was bound to a token as part of configuration.
    CounterpartySet { token: Token, pair: Address },
    /// A boost was configured or re-baselined.
    BoostConfigured {
        token: Token,
        pair: Address,
        rate_multiplier: RateMultiplier,
        tokens_per_second: Amount,
        available: Amount,
    },
    /// Rates were swapped after committing pending accrual.
    RatesUpdated {
        token: Token,
        rate_multiplier: RateMultiplier,
        tokens_per_second: Amount,
        available: Amount,
    },
    /// The counterparty was swapped with no accrual side effect.
    CounterpartyUpdated { token: Token, pair: Address },
    Deposited {
        token: Token,
        from: Address,
        amount: Amount,
        available: Amount,
    },
    Withdrawn {
        token: Token,
        to: Address,
        amount: Amount,
        available: Amount,
    },
    Accrued {
        token: Token,
        available: Amount,
        accrued_at: Timestamp,
    },
    /// A liquidation draw; `available` is the remaining balance.
    Liquidated {
        token: Token,
        receiver: Address,
        amount_out: Amount,
        available: Amount,
    },
}
