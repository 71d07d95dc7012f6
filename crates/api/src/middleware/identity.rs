//! Resolves the calling account.
//!
//! Authentication happens upstream; the proxy in front of the API forwards the
//! authenticated account id in the `X-Account-Id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use clinicbook_core::errors::ScheduleError;
use uuid::Uuid;

use super::error_handling::AppError;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// The authenticated caller's account id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .ok_or_else(|| unauthorized("Missing caller identity"))?
            .to_str()
            .map_err(|_| unauthorized("Malformed caller identity"))?;

        Uuid::parse_str(raw.trim())
            .map(CallerIdentity)
            .map_err(|_| unauthorized("Malformed caller identity"))
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError(ScheduleError::Unauthorized(message.to_string()))
}
