//! Storage contract for the scheduling core.
//!
//! Reads that only feed advisory views (slot listings, appointment lists) go through
//! [`ScheduleRepository`] directly. Anything that must be atomic (booking,
//! cancellation, completion, credit movements) runs inside a [`UnitOfWork`]
//! obtained from [`ScheduleRepository::begin`].
//!
//! Lock order inside a unit of work is: provider schedule first, then ledger
//! accounts in ascending id order.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::{
    errors::ScheduleResult,
    models::{
        account::{Account, ProviderProfile, Role, VerificationStatus},
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        availability::AvailabilityWindow,
        credit::{CreditTransaction, NewCreditTransaction},
    },
};

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_account(&self, id: Uuid) -> ScheduleResult<Option<Account>>;

    async fn update_account_role(
        &self,
        id: Uuid,
        role: Role,
        profile: Option<ProviderProfile>,
    ) -> ScheduleResult<Account>;

    async fn set_verification_status(
        &self,
        provider_id: Uuid,
        status: VerificationStatus,
    ) -> ScheduleResult<Account>;

    async fn list_providers(&self, status: VerificationStatus) -> ScheduleResult<Vec<Account>>;

    /// Providers in `status` whose specialty equals `specialty` case-insensitively,
    /// ordered by name.
    async fn list_providers_by_specialty(
        &self,
        specialty: &str,
        status: VerificationStatus,
    ) -> ScheduleResult<Vec<Account>>;

    /// The provider's current `AVAILABLE` window, if any.
    async fn find_availability(&self, provider_id: Uuid)
    -> ScheduleResult<Option<AvailabilityWindow>>;

    async fn list_availability(&self, provider_id: Uuid) -> ScheduleResult<Vec<AvailabilityWindow>>;

    /// Deletes the provider's windows that have no dependent appointment and inserts
    /// a fresh `AVAILABLE` one.
    async fn replace_availability(
        &self,
        provider_id: Uuid,
        start_time: NaiveTime,
        end_time: NaiveTime,
        now: DateTime<Utc>,
    ) -> ScheduleResult<AvailabilityWindow>;

    /// `SCHEDULED` appointments of the provider starting on or before `before_or_at`.
    async fn find_scheduled_appointments(
        &self,
        provider_id: Uuid,
        before_or_at: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Appointment>>;

    async fn find_appointment(&self, id: Uuid) -> ScheduleResult<Option<Appointment>>;

    async fn list_provider_appointments(
        &self,
        provider_id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> ScheduleResult<Vec<Appointment>>;

    async fn list_requester_appointments(
        &self,
        requester_id: Uuid,
    ) -> ScheduleResult<Vec<Appointment>>;

    async fn update_appointment_notes(
        &self,
        id: Uuid,
        notes: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment>;

    async fn set_session_token(
        &self,
        id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment>;

    async fn list_credit_transactions(
        &self,
        account_id: Uuid,
    ) -> ScheduleResult<Vec<CreditTransaction>>;

    async fn begin(&self) -> ScheduleResult<Box<dyn UnitOfWork>>;
}

/// One atomic transaction against the store. Dropping it without `commit` discards
/// every write made through it.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Serializes all schedule changes for one provider until commit or rollback.
    async fn lock_provider_schedule(&mut self, provider_id: Uuid) -> ScheduleResult<()>;

    /// Any `SCHEDULED` appointment of the provider overlapping `[start, end)`.
    async fn find_overlapping(
        &mut self,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ScheduleResult<Option<Appointment>>;

    async fn find_appointment_for_update(&mut self, id: Uuid)
    -> ScheduleResult<Option<Appointment>>;

    async fn insert_appointment(&mut self, appointment: &NewAppointment)
    -> ScheduleResult<Appointment>;

    async fn update_appointment_status(
        &mut self,
        id: Uuid,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment>;

    /// Locks the account's balance and returns it; `None` if the account is missing.
    async fn balance_for_update(&mut self, account_id: Uuid) -> ScheduleResult<Option<i64>>;

    /// Appends the entry and moves the cached balance by the same amount.
    async fn record_credit(
        &mut self,
        entry: &NewCreditTransaction,
    ) -> ScheduleResult<CreditTransaction>;

    async fn commit(self: Box<Self>) -> ScheduleResult<()>;

    async fn rollback(self: Box<Self>) -> ScheduleResult<()>;
}

/// Commits on success and rolls back on failure, returning the original outcome.
pub async fn finish<T>(uow: Box<dyn UnitOfWork>, outcome: ScheduleResult<T>) -> ScheduleResult<T> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!("Rollback failed after {}: {}", err, rollback_err);
            }
            Err(err)
        }
    }
}
