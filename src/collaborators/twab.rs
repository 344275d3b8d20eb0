//! HTTP client for a remote prize-pool TWAB oracle.

use super::{OracleError, SupplyOracle};
use crate::domain::{Address, Amount, Timestamp};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Supply oracle backed by a prize-pool TWAB query API.
#[derive(Debug, Clone)]
pub struct HttpSupplyOracle {
    client: Client,
    base_url: String,
}

impl HttpSupplyOracle {
    /// Create a new oracle client.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post_query(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, OracleError> {
        let url = format!("{}/twab", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(OracleError::NetworkError(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(OracleError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(OracleError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(OracleError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(OracleError::ParseError(e.to_string())))
        })
        .await
    }
}

fn parse_u128_field(value: &serde_json::Value, field: &str) -> Result<u128, OracleError> {
    let raw = value
        .get(field)
        .ok_or_else(|| OracleError::ParseError(format!("missing field {}", field)))?;
    if let Some(s) = raw.as_str() {
        return s
            .parse::<u128>()
            .map_err(|_| OracleError::ParseError(format!("invalid {}: {}", field, s)));
    }
    raw.as_u64()
        .map(u128::from)
        .ok_or_else(|| OracleError::ParseError(format!("invalid {}: {}", field, raw)))
}

fn parse_u64_field(value: &serde_json::Value, field: &str) -> Result<u64, OracleError> {
    value
        .get(field)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| OracleError::ParseError(format!("missing or invalid field {}", field)))
}

#[async_trait]
impl SupplyOracle for HttpSupplyOracle {
    async fn integrated_supply_between(
        &self,
        beneficiary: &Address,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Amount, OracleError> {
        debug!(
            "Fetching integrated supply for beneficiary={}, from={}, to={}",
            beneficiary, from, to
        );

        let payload = serde_json::json!({
            "type": "integratedSupplyBetween",
            "beneficiary": beneficiary.as_str(),
            "from": from.as_secs(),
            "to": to.as_secs(),
        });

        let response = self.post_query(payload).await?;
        parse_u128_field(&response, "weight").map(Amount::new)
    }

    async fn period_boundary_at_or_after(&self, at: Timestamp) -> Result<Timestamp, OracleError> {
        let payload = serde_json::json!({
            "type": "periodBoundaryAtOrAfter",
            "at": at.as_secs(),
        });

        let response = self.post_query(payload).await?;
        parse_u64_field(&response, "boundary").map(Timestamp::new)
    }

    async fn period_length(&self) -> Result<u64, OracleError> {
        let payload = serde_json::json!({ "type": "periodLength" });
        let response = self.post_query(payload).await?;
        parse_u64_field(&response, "seconds")
    }
}
