use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{now_or, AppState};
use crate::domain::{Address, Amount, LiquidationReceipt, Token};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidatableRequest {
    pub now: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidatableResponse {
    pub token: String,
    pub available: Amount,
}

/// The committing read: accrues before reporting, so the returned amount
/// is exactly what a draw at the same `now` may take.
pub async fn post_liquidatable(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<LiquidatableRequest>,
) -> Result<Json<LiquidatableResponse>, AppError> {
    let token = Token::new(token);
    let available = state
        .ledger
        .liquidatable_balance_of(&token, now_or(req.now))
        .await?;
    Ok(Json(LiquidatableResponse {
        token: token.as_str().to_string(),
        available,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutRequest {
    pub caller: String,
    pub receiver: String,
    pub token: String,
    pub amount_out: Amount,
    pub now: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutResponse {
    pub receipt: LiquidationReceipt,
    pub available: Amount,
}

pub async fn post_transfer_out(
    State(state): State<AppState>,
    Json(req): Json<TransferOutRequest>,
) -> Result<Json<TransferOutResponse>, AppError> {
    let token = Token::new(req.token);
    let receipt = state
        .ledger
        .transfer_out(
            &Address::new(req.caller),
            &Address::new(req.receiver),
            &token,
            req.amount_out,
            now_or(req.now),
        )
        .await?;
    let available = state
        .ledger
        .boost_of(&token)
        .map(|b| b.available)
        .unwrap_or(Amount::ZERO);
    Ok(Json(TransferOutResponse { receipt, available }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub caller: String,
    pub reference_token: String,
    pub amount_in: Amount,
    pub receipt: LiquidationReceipt,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub contributed: Amount,
}

pub async fn post_verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let contributed = state
        .ledger
        .verify_contribution(
            &Address::new(req.caller),
            &Token::new(req.reference_token),
            req.amount_in,
            &req.receipt,
        )
        .await?;
    Ok(Json(VerifyResponse { contributed }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetQuery {
    pub reference_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResponse {
    pub target: String,
}

pub async fn get_target(
    Query(params): Query<TargetQuery>,
    State(state): State<AppState>,
) -> Result<Json<TargetResponse>, AppError> {
    let target = state
        .ledger
        .target_of(&Token::new(params.reference_token))?;
    Ok(Json(TargetResponse {
        target: target.as_str().to_string(),
    }))
}
