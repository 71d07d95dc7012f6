//! Admin-only endpoints. The services reject non-admin callers with `Unauthorized`.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use clinicbook_core::models::{
    account::{Account, AllocateCreditsRequest, SetVerificationRequest, VerificationStatus},
    credit::CreditTransaction,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{error_handling::AppError, identity::CallerIdentity},
};

#[derive(Debug, Deserialize)]
pub struct ProviderQuery {
    /// Defaults to `PENDING`, the review queue.
    pub status: Option<VerificationStatus>,
}

#[axum::debug_handler]
pub async fn list_providers(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<Vec<Account>>, AppError> {
    let status = query.status.unwrap_or(VerificationStatus::Pending);
    let providers = state.accounts.list_providers(caller, status).await?;
    Ok(Json(providers))
}

#[axum::debug_handler]
pub async fn set_verification(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetVerificationRequest>,
) -> Result<Json<Account>, AppError> {
    let provider = state
        .accounts
        .set_verification(caller, id, payload.status)
        .await?;
    Ok(Json(provider))
}

#[axum::debug_handler]
pub async fn allocate_credits(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<AllocateCreditsRequest>,
) -> Result<Json<CreditTransaction>, AppError> {
    let entry = state
        .accounts
        .allocate_credits(caller, id, payload.amount)
        .await?;
    Ok(Json(entry))
}
