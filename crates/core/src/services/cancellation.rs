use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    errors::{ScheduleError, ScheduleResult},
    models::{
        appointment::{Appointment, AppointmentStatus},
        credit::TransactionKind,
    },
    policy::SchedulingPolicy,
    repository::{ScheduleRepository, UnitOfWork, finish},
    services::ledger::CreditLedger,
};

/// Cancels scheduled appointments and reverses the booking transfer.
///
/// The refund is always the full booking cost, however close to the start the
/// cancellation happens.
pub struct CancellationService {
    repo: Arc<dyn ScheduleRepository>,
    clock: Arc<dyn Clock>,
    ledger: CreditLedger,
    policy: SchedulingPolicy,
}

impl CancellationService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        clock: Arc<dyn Clock>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            repo,
            clock,
            ledger: CreditLedger::new(),
            policy,
        }
    }

    pub async fn cancel(&self, actor_id: Uuid, appointment_id: Uuid) -> ScheduleResult<Appointment> {
        info!("Cancelling appointment {} on behalf of {}", appointment_id, actor_id);

        self.repo.find_account(actor_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Account with ID {} not found", actor_id))
        })?;

        // Unlocked read to learn which provider schedule to lock.
        let snapshot = self
            .repo
            .find_appointment(appointment_id)
            .await?
            .ok_or_else(|| not_found(appointment_id))?;
        if !snapshot.is_party(actor_id) {
            warn!(
                "Account {} attempted to cancel appointment {} it is not part of",
                actor_id, appointment_id
            );
            return Err(ScheduleError::Unauthorized(
                "You are not authorized to cancel this appointment".to_string(),
            ));
        }

        let mut uow = self.repo.begin().await?;
        let outcome = self
            .cancel_in(uow.as_mut(), snapshot.provider_id, appointment_id)
            .await;
        let cancelled = finish(uow, outcome).await?;

        info!(
            "Appointment {} cancelled, {} credits returned to {}",
            cancelled.id, self.policy.booking_cost, cancelled.requester_id
        );
        Ok(cancelled)
    }

    async fn cancel_in(
        &self,
        uow: &mut dyn UnitOfWork,
        provider_id: Uuid,
        appointment_id: Uuid,
    ) -> ScheduleResult<Appointment> {
        uow.lock_provider_schedule(provider_id).await?;

        let appointment = uow
            .find_appointment_for_update(appointment_id)
            .await?
            .ok_or_else(|| not_found(appointment_id))?;

        if appointment.status.is_terminal() {
            return Err(ScheduleError::InvalidState(format!(
                "Appointment {} is {} and cannot be cancelled",
                appointment.id, appointment.status
            )));
        }

        let now = self.clock.now();
        let cancelled = uow
            .update_appointment_status(appointment.id, AppointmentStatus::Cancelled, now)
            .await?;

        // Exact inverse of the booking transfer.
        self.ledger
            .transfer(
                uow,
                appointment.provider_id,
                appointment.requester_id,
                self.policy.booking_cost,
                TransactionKind::AppointmentDeduction,
                now,
            )
            .await?;

        Ok(cancelled)
    }
}

fn not_found(appointment_id: Uuid) -> ScheduleError {
    ScheduleError::NotFound(format!("Appointment with ID {} not found", appointment_id))
}
