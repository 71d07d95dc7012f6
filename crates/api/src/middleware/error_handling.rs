//! # Error Handling Middleware
//!
//! Maps `ScheduleError` to HTTP status codes and a JSON body of the form
//! `{"error": "<message>", "retryable": <bool>}`, so every handler reports failures
//! the same way.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clinicbook_core::errors::ScheduleError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use clinicbook_api::middleware::error_handling::AppError;
/// use clinicbook_core::errors::ScheduleError;
/// use uuid::Uuid;
///
/// async fn handler(id: Uuid) -> Result<Json<Uuid>, AppError> {
///     Err(AppError(ScheduleError::NotFound(format!("Appointment with ID {} not found", id))))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub ScheduleError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScheduleError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ScheduleError::NotFound(_) | ScheduleError::NotConfigured(_) => StatusCode::NOT_FOUND,
            ScheduleError::Validation(_) => StatusCode::BAD_REQUEST,
            ScheduleError::SlotConflict { .. } | ScheduleError::InvalidState(_) => {
                StatusCode::CONFLICT
            }
            ScheduleError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            // 425 Too Early has no named constant.
            ScheduleError::TooEarly(_) => {
                StatusCode::from_u16(425).unwrap_or(StatusCode::CONFLICT)
            }
            ScheduleError::SessionAllocationFailed(_) => StatusCode::BAD_GATEWAY,
            ScheduleError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage details stay in the logs.
        let message = match &self.0 {
            ScheduleError::StorageUnavailable(report) => {
                error!("Storage failure: {:?}", report);
                "Storage unavailable, please retry".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": message,
            "retryable": self.0.is_retryable(),
        }));

        (status, body).into_response()
    }
}

/// Automatic conversion from ScheduleError to AppError
impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ScheduleError::StorageUnavailable(err))
    }
}

/// Maps a ScheduleError to an HTTP response
pub fn map_error(err: ScheduleError) -> Response {
    AppError(err).into_response()
}
