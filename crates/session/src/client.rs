use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinicbook_core::{
    errors::{ScheduleError, ScheduleResult},
    session::{SessionProvider, SessionRole, TokenMetadata},
};
use eyre::{Result, WrapErr, eyre};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SessionConfig;

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct IssueTokenRequest {
    role: SessionRole,
    /// Unix seconds.
    expire_time: i64,
    /// JSON-encoded connection data.
    data: String,
}

#[derive(Debug, Deserialize)]
struct IssueTokenResponse {
    token: String,
}

/// Talks to the session service over HTTP.
///
/// Every failure, transport or upstream, is reported as `SessionAllocationFailed`
/// so callers can retry.
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    client: Client,
    config: SessionConfig,
}

impl HttpSessionProvider {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .wrap_err("Failed to build session service client")?;

        Ok(Self { client, config })
    }

    /// Appends `segments` to the base URL, percent-encoding each one so opaque
    /// session handles cannot change the path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .wrap_err_with(|| format!("Invalid session service URL: {}", self.config.base_url))?;
        url.path_segments_mut()
            .map_err(|_| eyre!("Session service URL cannot be a base: {}", self.config.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn post(&self, segments: &[&str]) -> Result<RequestBuilder> {
        let request = self.client.post(self.endpoint(segments)?);
        Ok(match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        })
    }

    async fn send<T>(&self, request: RequestBuilder, what: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = request
            .send()
            .await
            .wrap_err_with(|| format!("Session service unreachable while trying to {}", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(eyre!("Failed to {}: {} {}", what, status, error_text));
        }

        response
            .json::<T>()
            .await
            .wrap_err_with(|| format!("Malformed session service response while trying to {}", what))
    }
}

fn allocation_failed(err: eyre::Report) -> ScheduleError {
    warn!("Session service call failed: {:#}", err);
    ScheduleError::SessionAllocationFailed(err.to_string())
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn create_session(&self) -> ScheduleResult<String> {
        let request = self.post(&["sessions"]).map_err(allocation_failed)?;
        let response: CreateSessionResponse = self
            .send(request, "create session")
            .await
            .map_err(allocation_failed)?;

        debug!("Created session {}", response.session_id);
        Ok(response.session_id)
    }

    async fn issue_token(
        &self,
        session_id: &str,
        role: SessionRole,
        expires_at: DateTime<Utc>,
        metadata: &TokenMetadata,
    ) -> ScheduleResult<String> {
        let data = serde_json::to_string(metadata)
            .wrap_err("Failed to encode token metadata")
            .map_err(allocation_failed)?;
        let body = IssueTokenRequest {
            role,
            expire_time: expires_at.timestamp(),
            data,
        };

        let request = self
            .post(&["sessions", session_id, "tokens"])
            .map_err(allocation_failed)?
            .json(&body);
        let response: IssueTokenResponse = self
            .send(request, "issue token")
            .await
            .map_err(allocation_failed)?;

        debug!("Issued {} token for session {}", role.as_str(), session_id);
        Ok(response.token)
    }
}
