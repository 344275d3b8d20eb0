use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{now_or, AppState};
use crate::domain::{Address, Amount, Token};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub caller: String,
    pub amount: Amount,
    pub now: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResponse {
    pub token: String,
    pub amount: Amount,
    /// Available balance after the post-withdrawal clamp.
    pub available: Amount,
}

pub async fn post_withdrawal(
    Path(token): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawResponse>, AppError> {
    let token = Token::new(token);
    let available = state
        .ledger
        .withdraw(
            &Address::new(req.caller),
            &token,
            req.amount,
            now_or(req.now),
        )
        .await?;
    Ok(Json(WithdrawResponse {
        token: token.as_str().to_string(),
        amount: req.amount,
        available,
    }))
}
