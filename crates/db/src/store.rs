//! PostgreSQL backend for the scheduling ports.
//!
//! A unit of work owns one `sqlx` transaction. Provider schedules are serialized by a
//! `FOR UPDATE` lock on the provider's account row, and balances by the same lock on
//! each ledger account, which `CreditLedger` takes in ascending id order.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use clinicbook_core::{
    errors::{ScheduleError, ScheduleResult},
    models::{
        account::{Account, ProviderProfile, Role, VerificationStatus},
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        availability::AvailabilityWindow,
        credit::{CreditTransaction, NewCreditTransaction},
    },
    repository::{ScheduleRepository, UnitOfWork},
};
use eyre::WrapErr;
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::{
    DbPool,
    models::convert_all,
    repositories::{accounts, appointments, availability, credits},
};

#[derive(Debug, Clone)]
pub struct PgScheduleRepository {
    pool: DbPool,
}

impl PgScheduleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn appointment_not_found(id: Uuid) -> ScheduleError {
    ScheduleError::NotFound(format!("Appointment with ID {} not found", id))
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn find_account(&self, id: Uuid) -> ScheduleResult<Option<Account>> {
        let row = accounts::get_account_by_id(&self.pool, id).await?;
        Ok(row.map(Account::try_from).transpose()?)
    }

    async fn update_account_role(
        &self,
        id: Uuid,
        role: Role,
        profile: Option<ProviderProfile>,
    ) -> ScheduleResult<Account> {
        let columns = profile.as_ref().map(|p| accounts::ProfileColumns {
            specialty: &p.specialty,
            experience_years: p.experience_years,
            credential_url: &p.credential_url,
            description: &p.description,
            verification_status: p.verification_status.as_str(),
        });
        let row = accounts::update_role(&self.pool, id, role.as_str(), columns)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Account with ID {} not found", id)))?;
        Ok(Account::try_from(row)?)
    }

    async fn set_verification_status(
        &self,
        provider_id: Uuid,
        status: VerificationStatus,
    ) -> ScheduleResult<Account> {
        let row = accounts::set_verification_status(&self.pool, provider_id, status.as_str())
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Provider with ID {} not found", provider_id))
            })?;
        Ok(Account::try_from(row)?)
    }

    async fn list_providers(&self, status: VerificationStatus) -> ScheduleResult<Vec<Account>> {
        let rows = accounts::get_providers_by_status(&self.pool, status.as_str()).await?;
        Ok(convert_all(rows)?)
    }

    async fn list_providers_by_specialty(
        &self,
        specialty: &str,
        status: VerificationStatus,
    ) -> ScheduleResult<Vec<Account>> {
        let rows =
            accounts::get_providers_by_specialty(&self.pool, specialty, status.as_str()).await?;
        Ok(convert_all(rows)?)
    }

    async fn find_availability(
        &self,
        provider_id: Uuid,
    ) -> ScheduleResult<Option<AvailabilityWindow>> {
        let row = availability::get_available_by_provider(&self.pool, provider_id).await?;
        Ok(row.map(AvailabilityWindow::try_from).transpose()?)
    }

    async fn list_availability(&self, provider_id: Uuid) -> ScheduleResult<Vec<AvailabilityWindow>> {
        let rows = availability::get_availabilities_by_provider(&self.pool, provider_id).await?;
        Ok(convert_all(rows)?)
    }

    async fn replace_availability(
        &self,
        provider_id: Uuid,
        start_time: NaiveTime,
        end_time: NaiveTime,
        now: DateTime<Utc>,
    ) -> ScheduleResult<AvailabilityWindow> {
        let mut tx = self
            .pool
            .begin()
            .await
            .wrap_err("Failed to begin availability transaction")?;

        let removed = availability::delete_availabilities_by_provider(&mut *tx, provider_id).await?;
        let row =
            availability::create_availability(&mut *tx, provider_id, start_time, end_time, now)
                .await?;
        tx.commit()
            .await
            .wrap_err("Failed to commit availability transaction")?;

        debug!("Replaced {} availability windows for provider {}", removed, provider_id);
        Ok(AvailabilityWindow::try_from(row)?)
    }

    async fn find_scheduled_appointments(
        &self,
        provider_id: Uuid,
        before_or_at: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Appointment>> {
        let rows = appointments::get_scheduled_before(&self.pool, provider_id, before_or_at).await?;
        Ok(convert_all(rows)?)
    }

    async fn find_appointment(&self, id: Uuid) -> ScheduleResult<Option<Appointment>> {
        let row = appointments::get_appointment_by_id(&self.pool, id).await?;
        Ok(row.map(Appointment::try_from).transpose()?)
    }

    async fn list_provider_appointments(
        &self,
        provider_id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> ScheduleResult<Vec<Appointment>> {
        let rows = appointments::get_appointments_by_provider(
            &self.pool,
            provider_id,
            status.as_ref().map(AppointmentStatus::as_str),
        )
        .await?;
        Ok(convert_all(rows)?)
    }

    async fn list_requester_appointments(
        &self,
        requester_id: Uuid,
    ) -> ScheduleResult<Vec<Appointment>> {
        let rows = appointments::get_appointments_by_requester(&self.pool, requester_id).await?;
        Ok(convert_all(rows)?)
    }

    async fn update_appointment_notes(
        &self,
        id: Uuid,
        notes: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        let row = appointments::update_clinical_note(&self.pool, id, notes, now)
            .await?
            .ok_or_else(|| appointment_not_found(id))?;
        Ok(Appointment::try_from(row)?)
    }

    async fn set_session_token(
        &self,
        id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        let row = appointments::update_session_token(&self.pool, id, token, now)
            .await?
            .ok_or_else(|| appointment_not_found(id))?;
        Ok(Appointment::try_from(row)?)
    }

    async fn list_credit_transactions(
        &self,
        account_id: Uuid,
    ) -> ScheduleResult<Vec<CreditTransaction>> {
        let rows = credits::get_transactions_by_account(&self.pool, account_id).await?;
        Ok(convert_all(rows)?)
    }

    async fn begin(&self) -> ScheduleResult<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .wrap_err("Failed to begin transaction")?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// One open database transaction. Dropping it without `commit` rolls back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_provider_schedule(&mut self, provider_id: Uuid) -> ScheduleResult<()> {
        accounts::lock_account(&mut *self.tx, provider_id)
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Provider with ID {} not found", provider_id))
            })?;
        Ok(())
    }

    async fn find_overlapping(
        &mut self,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ScheduleResult<Option<Appointment>> {
        let row = appointments::find_overlapping(&mut *self.tx, provider_id, start, end).await?;
        Ok(row.map(Appointment::try_from).transpose()?)
    }

    async fn find_appointment_for_update(
        &mut self,
        id: Uuid,
    ) -> ScheduleResult<Option<Appointment>> {
        let row = appointments::lock_appointment(&mut *self.tx, id).await?;
        Ok(row.map(Appointment::try_from).transpose()?)
    }

    async fn insert_appointment(
        &mut self,
        appointment: &NewAppointment,
    ) -> ScheduleResult<Appointment> {
        let row = appointments::create_appointment(
            &mut *self.tx,
            appointment.provider_id,
            appointment.requester_id,
            appointment.start_time,
            appointment.end_time,
            appointment.requester_note.as_deref(),
            &appointment.session_id,
            appointment.created_at,
        )
        .await?;
        Ok(Appointment::try_from(row)?)
    }

    async fn update_appointment_status(
        &mut self,
        id: Uuid,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        let row = appointments::update_status(&mut *self.tx, id, status.as_str(), now)
            .await?
            .ok_or_else(|| appointment_not_found(id))?;
        Ok(Appointment::try_from(row)?)
    }

    async fn balance_for_update(&mut self, account_id: Uuid) -> ScheduleResult<Option<i64>> {
        Ok(accounts::lock_account(&mut *self.tx, account_id).await?)
    }

    async fn record_credit(
        &mut self,
        entry: &NewCreditTransaction,
    ) -> ScheduleResult<CreditTransaction> {
        let balance = accounts::lock_account(&mut *self.tx, entry.account_id)
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Account with ID {} not found", entry.account_id))
            })?;
        if balance + entry.amount < 0 {
            return Err(ScheduleError::InsufficientCredits {
                balance,
                required: -entry.amount,
            });
        }

        let row = credits::create_transaction(
            &mut *self.tx,
            entry.account_id,
            entry.amount,
            entry.kind.as_str(),
            entry.created_at,
        )
        .await?;
        accounts::adjust_credits(&mut *self.tx, entry.account_id, entry.amount).await?;

        Ok(CreditTransaction::try_from(row)?)
    }

    async fn commit(self: Box<Self>) -> ScheduleResult<()> {
        self.tx.commit().await.wrap_err("Failed to commit transaction")?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> ScheduleResult<()> {
        self.tx
            .rollback()
            .await
            .wrap_err("Failed to roll back transaction")?;
        Ok(())
    }
}
