use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Availability not configured for provider {0}")]
    NotConfigured(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Time slot {start} - {end} is already booked")]
    SlotConflict {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Insufficient credits: balance {balance}, required {required}")]
    InsufficientCredits { balance: i64, required: i64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Too early: {0}")]
    TooEarly(String),

    #[error("Session allocation failed: {0}")]
    SessionAllocationFailed(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] eyre::Report),
}

impl ScheduleError {
    /// Whether the same request may succeed if simply retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScheduleError::StorageUnavailable(_) | ScheduleError::SessionAllocationFailed(_)
        )
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
