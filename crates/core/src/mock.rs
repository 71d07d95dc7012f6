use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;

use crate::{
    errors::ScheduleResult,
    session::{SessionProvider, SessionRole, TokenMetadata},
};

// Mock session provider for testing
mock! {
    pub SessionProvider {}

    #[async_trait]
    impl SessionProvider for SessionProvider {
        async fn create_session(&self) -> ScheduleResult<String>;

        async fn issue_token(
            &self,
            session_id: &str,
            role: SessionRole,
            expires_at: DateTime<Utc>,
            metadata: &TokenMetadata,
        ) -> ScheduleResult<String>;
    }
}
