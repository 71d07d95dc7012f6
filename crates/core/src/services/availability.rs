use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    clock::Clock,
    errors::{ScheduleError, ScheduleResult},
    models::{
        account::{Account, VerificationStatus},
        availability::{AvailabilityWindow, AvailableSlotsResponse},
    },
    policy::SchedulingPolicy,
    repository::ScheduleRepository,
    services::slots::SlotGenerator,
};

/// Provider availability windows and the slot listing derived from them.
pub struct AvailabilityService {
    repo: Arc<dyn ScheduleRepository>,
    clock: Arc<dyn Clock>,
    generator: SlotGenerator,
}

impl AvailabilityService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        clock: Arc<dyn Clock>,
        policy: &SchedulingPolicy,
    ) -> ScheduleResult<Self> {
        Ok(Self {
            repo,
            clock,
            generator: SlotGenerator::new(policy)?,
        })
    }

    pub async fn set_availability(
        &self,
        provider_id: Uuid,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> ScheduleResult<AvailabilityWindow> {
        self.require_provider(provider_id).await?;

        if start_time >= end_time {
            return Err(ScheduleError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        let window = self
            .repo
            .replace_availability(provider_id, start_time, end_time, self.clock.now())
            .await?;

        info!(
            "Provider {} availability set to {} - {}",
            provider_id, window.start_time, window.end_time
        );
        Ok(window)
    }

    pub async fn get_availability(&self, provider_id: Uuid) -> ScheduleResult<Vec<AvailabilityWindow>> {
        self.require_provider(provider_id).await?;
        self.repo.list_availability(provider_id).await
    }

    /// A verified provider, as shown to requesters.
    pub async fn get_provider(&self, provider_id: Uuid) -> ScheduleResult<Account> {
        self.repo
            .find_account(provider_id)
            .await?
            .filter(Account::is_schedulable_provider)
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Provider with ID {} not found", provider_id))
            })
    }

    /// Verified providers whose specialty matches, ignoring case and surrounding
    /// whitespace, ordered by name.
    pub async fn list_providers_by_specialty(&self, specialty: &str) -> ScheduleResult<Vec<Account>> {
        let specialty = specialty.trim();
        if specialty.is_empty() {
            return Err(ScheduleError::Validation("Specialty is required".to_string()));
        }

        let providers = self
            .repo
            .list_providers_by_specialty(specialty, VerificationStatus::Verified)
            .await?;
        debug!("Found {} verified providers for {}", providers.len(), specialty);
        Ok(providers)
    }

    /// Free slots over the horizon, computed from current repository state on every
    /// call. Fails with `NotConfigured` when the provider never set a window.
    pub async fn available_slots(&self, provider_id: Uuid) -> ScheduleResult<AvailableSlotsResponse> {
        let provider = self.get_provider(provider_id).await?;

        let window = self
            .repo
            .find_availability(provider.id)
            .await?
            .ok_or(ScheduleError::NotConfigured(provider.id))?;

        let now = self.clock.now();
        let existing = self
            .repo
            .find_scheduled_appointments(provider.id, self.generator.horizon_end(now))
            .await?;
        debug!(
            "Generating slots for provider {} against {} scheduled appointments",
            provider.id,
            existing.len()
        );

        let days = self.generator.generate(&window, now, &existing).collect();
        Ok(AvailableSlotsResponse { days })
    }

    async fn require_provider(&self, provider_id: Uuid) -> ScheduleResult<Account> {
        self.repo
            .find_account(provider_id)
            .await?
            .filter(Account::is_provider)
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Provider with ID {} not found", provider_id))
            })
    }
}
