//! Capability seams to the external collaborators: token custody, the
//! prize-pool contribution sink, and the supply/TWAB oracle.

use crate::domain::{Address, Amount, Timestamp, Token};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod twab;

pub use memory::{InMemoryBank, MemorySink, MemoryTwab};
pub use twab::HttpSupplyOracle;

/// Token custody capability scoped to the ledger's holdings.
///
/// Implementations must fail a transfer rather than partially apply it;
/// the ledger propagates custody failures, never swallows them.
#[async_trait]
pub trait Custody: Send + Sync + fmt::Debug {
    /// Balance of `token` currently held in the ledger's custody account.
    async fn balance_of(&self, token: &Token) -> Result<Amount, CustodyError>;

    /// Move `amount` of `token` out of the ledger's custody account to `to`.
    async fn transfer(&self, token: &Token, to: &Address, amount: Amount)
        -> Result<(), CustodyError>;

    /// Move `amount` of `token` from `from` to `to`.
    async fn transfer_from(
        &self,
        token: &Token,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("insufficient balance of {token}: requested {requested}, held {held}")]
    InsufficientBalance {
        token: Token,
        requested: Amount,
        held: Amount,
    },
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// External ledger that records reference-token contributions attributed
/// to the beneficiary.
#[async_trait]
pub trait ContributionSink: Send + Sync + fmt::Debug {
    /// Record a contribution; returns the amount actually committed.
    async fn contribute(&self, beneficiary: &Address, amount: Amount) -> Result<Amount, SinkError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("contribution rejected: {0}")]
    Rejected(String),
}

/// Time-weighted supply oracle over the beneficiary's claim-weight,
/// quantized to a fixed period.
#[async_trait]
pub trait SupplyOracle: Send + Sync + fmt::Debug {
    /// Time-weighted average total claim-weight of `beneficiary` over
    /// `[from, to]`, in token units.
    async fn integrated_supply_between(
        &self,
        beneficiary: &Address,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Amount, OracleError>;

    /// The first period boundary at or after `at`.
    async fn period_boundary_at_or_after(&self, at: Timestamp) -> Result<Timestamp, OracleError>;

    /// Length of one oracle period, in seconds.
    async fn period_length(&self) -> Result<u64, OracleError>;
}

/// Error type for oracle queries.
#[derive(Debug, Clone)]
pub enum OracleError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Other error
    Other(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            OracleError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            OracleError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            OracleError::RateLimited => write!(f, "Rate limited"),
            OracleError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for OracleError {}
