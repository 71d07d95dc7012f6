use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::sync::Arc;

use crate::ApiState;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Build version plus the scheduling rules clients need to render slots.
#[derive(Serialize)]
struct VersionResponse {
    version: String,
    timezone: String,
    slot_minutes: i64,
    horizon_days: u32,
    booking_cost: i64,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn version(State(state): State<Arc<ApiState>>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timezone: state.policy.timezone.name().to_string(),
        slot_minutes: state.policy.slot_minutes,
        horizon_days: state.policy.horizon_days,
        booking_cost: state.policy.booking_cost,
    })
}

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
}
