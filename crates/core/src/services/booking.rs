//! # Booking
//!
//! `book` validates the request, then runs conflict check, session allocation,
//! credit transfer and appointment insert inside one unit of work. Any failure after
//! `begin` rolls the whole unit back, so callers never observe a half-made booking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    errors::{ScheduleError, ScheduleResult},
    models::{
        account::Account,
        appointment::{Appointment, BookAppointmentRequest, NewAppointment},
        credit::TransactionKind,
    },
    policy::SchedulingPolicy,
    repository::{ScheduleRepository, UnitOfWork, finish},
    services::ledger::CreditLedger,
    session::SessionProvider,
};

pub struct BookingService {
    repo: Arc<dyn ScheduleRepository>,
    sessions: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    ledger: CreditLedger,
    policy: SchedulingPolicy,
}

impl BookingService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        sessions: Arc<dyn SessionProvider>,
        clock: Arc<dyn Clock>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            repo,
            sessions,
            clock,
            ledger: CreditLedger::new(),
            policy,
        }
    }

    pub async fn book(
        &self,
        requester_id: Uuid,
        request: &BookAppointmentRequest,
    ) -> ScheduleResult<Appointment> {
        info!(
            "Booking appointment for requester {} with provider {} at {}",
            requester_id, request.provider_id, request.start
        );

        self.validate_interval(request.start, request.end)?;
        let requester = self.load_requester(requester_id).await?;
        let provider = self.load_provider(request.provider_id).await?;

        // Early rejection; the ledger re-checks under lock.
        if requester.credits < self.policy.booking_cost {
            warn!(
                "Requester {} has {} credits, booking costs {}",
                requester.id, requester.credits, self.policy.booking_cost
            );
            return Err(ScheduleError::InsufficientCredits {
                balance: requester.credits,
                required: self.policy.booking_cost,
            });
        }

        let mut uow = self.repo.begin().await?;
        let outcome = self
            .book_in(uow.as_mut(), &requester, &provider, request)
            .await;
        let appointment = finish(uow, outcome).await?;

        info!(
            "Appointment {} booked with provider {} from {} to {}",
            appointment.id, appointment.provider_id, appointment.start_time, appointment.end_time
        );
        Ok(appointment)
    }

    async fn book_in(
        &self,
        uow: &mut dyn UnitOfWork,
        requester: &Account,
        provider: &Account,
        request: &BookAppointmentRequest,
    ) -> ScheduleResult<Appointment> {
        uow.lock_provider_schedule(provider.id).await?;

        if let Some(existing) = uow
            .find_overlapping(provider.id, request.start, request.end)
            .await?
        {
            warn!(
                "Slot {} - {} for provider {} conflicts with appointment {}",
                request.start, request.end, provider.id, existing.id
            );
            return Err(ScheduleError::SlotConflict {
                start: request.start,
                end: request.end,
            });
        }

        let session_id = self.sessions.create_session().await.map_err(|e| match e {
            ScheduleError::SessionAllocationFailed(_) => e,
            other => ScheduleError::SessionAllocationFailed(other.to_string()),
        })?;

        let now = self.clock.now();
        self.ledger
            .transfer(
                uow,
                requester.id,
                provider.id,
                self.policy.booking_cost,
                TransactionKind::AppointmentDeduction,
                now,
            )
            .await?;

        uow.insert_appointment(&NewAppointment {
            provider_id: provider.id,
            requester_id: requester.id,
            start_time: request.start,
            end_time: request.end,
            requester_note: request
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            session_id,
            created_at: now,
        })
        .await
    }

    fn validate_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduleResult<()> {
        if start >= end {
            return Err(ScheduleError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        let minutes = (end - start).num_minutes();
        let whole_minutes = (end - start).num_seconds() % 60 == 0;
        if !whole_minutes || minutes % self.policy.slot_minutes != 0 {
            return Err(ScheduleError::Validation(format!(
                "Appointment duration must be a multiple of {} minutes",
                self.policy.slot_minutes
            )));
        }
        Ok(())
    }

    async fn load_requester(&self, requester_id: Uuid) -> ScheduleResult<Account> {
        self.repo
            .find_account(requester_id)
            .await?
            .filter(Account::is_requester)
            .ok_or_else(|| {
                ScheduleError::NotFound(format!("Requester with ID {} not found", requester_id))
            })
    }

    async fn load_provider(&self, provider_id: Uuid) -> ScheduleResult<Account> {
        self.repo
            .find_account(provider_id)
            .await?
            .filter(Account::is_schedulable_provider)
            .ok_or_else(|| {
                ScheduleError::NotFound(format!(
                    "Provider with ID {} not found or not verified",
                    provider_id
                ))
            })
    }
}
