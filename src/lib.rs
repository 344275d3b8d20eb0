pub mod api;
pub mod auth;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;

pub use auth::{Authorization, SingleOwner};
pub use collaborators::{
    ContributionSink, Custody, CustodyError, HttpSupplyOracle, InMemoryBank, MemorySink,
    MemoryTwab, OracleError, SinkError, SupplyOracle,
};
pub use config::Config;
pub use domain::{
    Address, Amount, Boost, LiquidationReceipt, RateMultiplier, Timestamp, Token,
};
pub use engine::{BoostLedger, LedgerError, LedgerEvent};
pub use error::AppError;
