use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use clinicbook_core::models::appointment::{
    AddNotesRequest, Appointment, BookAppointmentRequest, JoinAuthorization,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{error_handling::AppError, identity::CallerIdentity},
};

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let appointment = state.booking.book(caller, &payload).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = state.appointments.list_for(caller).await?;
    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.cancellation.cancel(caller, id).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.appointments.complete(caller, id).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn join_appointment(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<JoinAuthorization>, AppError> {
    let authorization = state.appointments.authorize_join(caller, id).await?;
    Ok(Json(authorization))
}

#[axum::debug_handler]
pub async fn add_notes(
    State(state): State<Arc<ApiState>>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddNotesRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state
        .appointments
        .add_notes(caller, id, &payload.notes)
        .await?;
    Ok(Json(appointment))
}
