use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ScheduleResult, models::account::Role};

/// Access level of an issued token. Both parties join as publishers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Publisher,
}

impl SessionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionRole::Publisher => "publisher",
        }
    }
}

/// Connection data embedded in an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub account_id: Uuid,
    pub name: String,
    pub role: Role,
}

/// Hosts real-time sessions for appointments.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Allocates a new session and returns its opaque handle.
    async fn create_session(&self) -> ScheduleResult<String>;

    /// Issues an access token for `session_id` valid until `expires_at`.
    async fn issue_token(
        &self,
        session_id: &str,
        role: SessionRole,
        expires_at: DateTime<Utc>,
        metadata: &TokenMetadata,
    ) -> ScheduleResult<String>;
}
