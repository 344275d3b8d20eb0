use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{now_or, AppState};
use crate::domain::{Address, Amount, Token};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub from: String,
    pub amount: Amount,
    pub now: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    pub token: String,
    pub amount: Amount,
    /// Available balance committed by the pre-deposit accrual.
    pub available: Amount,
}

pub async fn post_deposit(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<DepositResponse>, AppError> {
    let token = Token::new(token);
    let available = state
        .ledger
        .deposit(
            &token,
            req.amount,
            &Address::new(req.from),
            now_or(req.now),
        )
        .await?;
    Ok(Json(DepositResponse {
        token: token.as_str().to_string(),
        amount: req.amount,
        available,
    }))
}
