//! # Availability Handlers
//!
//! Requesters browse a verified provider and its open slots; providers read and
//! replace their own daily window.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use clinicbook_core::{
    errors::ScheduleError,
    models::{
        account::ProviderResponse,
        availability::{AvailabilityWindow, AvailableSlotsResponse, SetAvailabilityRequest},
    },
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{error_handling::AppError, identity::CallerIdentity},
};

#[derive(Debug, Deserialize)]
pub struct SpecialtyQuery {
    pub specialty: String,
}

/// Verified providers in one specialty.
///
/// # Endpoint
///
/// ```text
/// GET /api/providers?specialty=Dermatology
/// ```
#[axum::debug_handler]
pub async fn list_providers_by_specialty(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SpecialtyQuery>,
) -> Result<Json<Vec<ProviderResponse>>, AppError> {
    let providers = state
        .availability
        .list_providers_by_specialty(&query.specialty)
        .await?;

    Ok(Json(
        providers.iter().filter_map(ProviderResponse::from_account).collect(),
    ))
}

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProviderResponse>, AppError> {
    let provider = state.availability.get_provider(id).await?;
    let response = ProviderResponse::from_account(&provider)
        .ok_or_else(|| ScheduleError::NotFound(format!("Provider with ID {} not found", id)))?;

    Ok(Json(response))
}

/// Open slots for the next few days.
///
/// # Endpoint
///
/// ```text
/// GET /api/providers/:id/slots
/// ```
///
/// # Errors
///
/// * `NotFound` - Unknown or unverified provider
/// * `NotConfigured` - The provider never set a window
#[axum::debug_handler]
pub async fn available_slots(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailableSlotsResponse>, AppError> {
    let slots = state.availability.available_slots(id).await?;
    Ok(Json(slots))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<Vec<AvailabilityWindow>>, AppError> {
    let windows = state.availability.get_availability(caller).await?;
    Ok(Json(windows))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<Json<AvailabilityWindow>, AppError> {
    let window = state
        .availability
        .set_availability(caller, payload.start_time, payload.end_time)
        .await?;

    Ok(Json(window))
}
