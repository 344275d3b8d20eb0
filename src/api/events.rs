use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::engine::LedgerEvent;

pub async fn get_events(State(state): State<AppState>) -> Json<Vec<LedgerEvent>> {
    Json(state.ledger.events())
}
