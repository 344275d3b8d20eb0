pub mod boosts;
pub mod deposits;
pub mod events;
pub mod health;
pub mod liquidations;
pub mod withdrawals;

use crate::domain::Timestamp;
use crate::engine::BoostLedger;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<BoostLedger>,
}

/// Caller-supplied timestamp, defaulting to wall clock.
pub(crate) fn now_or(now: Option<u64>) -> Timestamp {
    now.map(Timestamp::new).unwrap_or_else(Timestamp::now)
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/boosts", post(boosts::set_boost))
        .route("/v1/boosts/:token", get(boosts::get_boost))
        .route("/v1/boosts/:token/available", get(boosts::get_available))
        .route("/v1/boosts/:token/accrue", post(boosts::accrue))
        .route("/v1/boosts/:token/rates", post(boosts::update_rates))
        .route("/v1/boosts/:token/pair", post(boosts::update_pair))
        .route("/v1/boosts/:token/deposits", post(deposits::post_deposit))
        .route(
            "/v1/boosts/:token/withdrawals",
            post(withdrawals::post_withdrawal),
        )
        .route(
            "/v1/boosts/:token/liquidatable",
            post(liquidations::post_liquidatable),
        )
        .route(
            "/v1/liquidations/transfer-out",
            post(liquidations::post_transfer_out),
        )
        .route("/v1/liquidations/verify", post(liquidations::post_verify))
        .route("/v1/target", get(liquidations::get_target))
        .route("/v1/events", get(events::get_events))
        .layer(cors)
        .with_state(state)
}
