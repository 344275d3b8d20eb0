use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{now_or, AppState};
use crate::domain::{Address, Amount, Boost, RateMultiplier, Token};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBoostRequest {
    pub caller: String,
    pub token: String,
    pub liquidation_pair: String,
    pub rate_multiplier: RateMultiplier,
    pub tokens_per_second: Amount,
    pub seed_available: Amount,
    pub now: Option<u64>,
}

pub async fn set_boost(
    State(state): State<AppState>,
    Json(req): Json<SetBoostRequest>,
) -> Result<Json<Boost>, AppError> {
    let boost = state
        .ledger
        .set_boost(
            &Address::new(req.caller),
            &Token::new(req.token),
            &Address::new(req.liquidation_pair),
            req.rate_multiplier,
            req.tokens_per_second,
            req.seed_available,
            now_or(req.now),
        )
        .await?;
    Ok(Json(boost))
}

pub async fn get_boost(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Boost>, AppError> {
    let token = Token::new(token);
    state
        .ledger
        .boost_of(&token)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("token {} has no boost configured", token)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuery {
    pub now: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableResponse {
    pub token: String,
    pub available: Amount,
    pub accrued_at: u64,
}

pub async fn get_available(
    Path(token): Path<String>,
    Query(params): Query<AvailableQuery>,
    State(state): State<AppState>,
) -> Result<Json<AvailableResponse>, AppError> {
    let token = Token::new(token);
    let (available, accrued_at) = state
        .ledger
        .compute_available(&token, now_or(params.now))
        .await?;
    Ok(Json(AvailableResponse {
        token: token.as_str().to_string(),
        available,
        accrued_at: accrued_at.as_secs(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrueRequest {
    pub now: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrueResponse {
    pub token: String,
    pub available: Amount,
}

pub async fn accrue(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<AccrueRequest>,
) -> Result<Json<AccrueResponse>, AppError> {
    let token = Token::new(token);
    let available = state.ledger.accrue(&token, now_or(req.now)).await?;
    Ok(Json(AccrueResponse {
        token: token.as_str().to_string(),
        available,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRatesRequest {
    pub caller: String,
    pub rate_multiplier: RateMultiplier,
    pub tokens_per_second: Amount,
    pub now: Option<u64>,
}

pub async fn update_rates(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateRatesRequest>,
) -> Result<Json<Boost>, AppError> {
    let boost = state
        .ledger
        .update_rates(
            &Address::new(req.caller),
            &Token::new(token),
            req.rate_multiplier,
            req.tokens_per_second,
            now_or(req.now),
        )
        .await?;
    Ok(Json(boost))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePairRequest {
    pub caller: String,
    pub liquidation_pair: String,
}

pub async fn update_pair(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdatePairRequest>,
) -> Result<Json<Boost>, AppError> {
    let token = Token::new(token);
    state
        .ledger
        .update_counterparty(
            &Address::new(req.caller),
            &token,
            &Address::new(req.liquidation_pair),
        )
        .await?;
    state
        .ledger
        .boost_of(&token)
        .map(Json)
        .ok_or_else(|| AppError::Internal("boost vanished after update".to_string()))
}
