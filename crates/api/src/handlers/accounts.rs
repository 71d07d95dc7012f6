use axum::{Json, extract::State};
use clinicbook_core::models::{
    account::{Account, SetRoleRequest},
    credit::{CreditHistoryResponse, EarningsSummary},
};
use std::sync::Arc;

use crate::{
    ApiState,
    middleware::{error_handling::AppError, identity::CallerIdentity},
};

#[axum::debug_handler]
pub async fn set_role(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<Account>, AppError> {
    let account = state.accounts.set_role(caller, &payload).await?;
    Ok(Json(account))
}

#[axum::debug_handler]
pub async fn credit_history(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<CreditHistoryResponse>, AppError> {
    let history = state.accounts.credit_history(caller).await?;
    Ok(Json(history))
}

/// Provider dashboard earnings for the caller.
#[axum::debug_handler]
pub async fn earnings(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<EarningsSummary>, AppError> {
    let summary = state.accounts.earnings(caller).await?;
    Ok(Json(summary))
}
