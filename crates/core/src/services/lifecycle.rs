//! Post-booking operations on a single appointment: completion, session joins,
//! clinical notes, and per-party listings.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    errors::{ScheduleError, ScheduleResult},
    models::{
        account::{Account, Role},
        appointment::{Appointment, AppointmentStatus, JoinAuthorization},
    },
    policy::SchedulingPolicy,
    repository::{ScheduleRepository, UnitOfWork, finish},
    session::{SessionProvider, SessionRole, TokenMetadata},
};

pub struct AppointmentService {
    repo: Arc<dyn ScheduleRepository>,
    sessions: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    policy: SchedulingPolicy,
}

impl AppointmentService {
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
            policy,
        }
    }

    /// Marks a past appointment as completed. Only the owning provider may do this,
    /// only once, and only after the scheduled end. Credits are untouched.
    pub async fn complete(&self, provider_id: Uuid, appointment_id: Uuid) -> ScheduleResult<Appointment> {
        let mut uow = self.repo.begin().await?;
        let outcome = self.complete_in(uow.as_mut(), provider_id, appointment_id).await;
        let completed = finish(uow, outcome).await?;

        info!("Appointment {} marked completed by {}", completed.id, provider_id);
        Ok(completed)
    }

    async fn complete_in(
        &self,
        uow: &mut dyn UnitOfWork,
        provider_id: Uuid,
        appointment_id: Uuid,
    ) -> ScheduleResult<Appointment> {
        let appointment = uow
            .find_appointment_for_update(appointment_id)
            .await?
            .filter(|a| a.provider_id == provider_id)
            .ok_or_else(|| {
                ScheduleError::NotFound(format!(
                    "Appointment with ID {} not found or not authorized",
                    appointment_id
                ))
            })?;

        if appointment.status.is_terminal() {
            return Err(ScheduleError::InvalidState(
                "Only scheduled appointments can be marked as completed".to_string(),
            ));
        }

        let now = self.clock.now();
        if now < appointment.end_time {
            return Err(ScheduleError::TooEarly(
                "Cannot mark appointment as completed before the scheduled end time".to_string(),
            ));
        }

        uow.update_appointment_status(appointment.id, AppointmentStatus::Completed, now)
            .await
    }

    /// Issues a session access token to one of the two parties, valid until the
    /// appointment end plus the grace period. The latest token is stored on the
    /// appointment.
    pub async fn authorize_join(
        &self,
        actor_id: Uuid,
        appointment_id: Uuid,
    ) -> ScheduleResult<JoinAuthorization> {
        let actor = self.load_account(actor_id).await?;
        let appointment = self.load_appointment(appointment_id).await?;

        if !appointment.is_party(actor.id) {
            warn!(
                "Account {} attempted to join appointment {} it is not part of",
                actor.id, appointment.id
            );
            return Err(ScheduleError::Unauthorized(
                "You are not authorized to join this call".to_string(),
            ));
        }

        if appointment.status.is_terminal() {
            return Err(ScheduleError::InvalidState(
                "This appointment is not currently scheduled".to_string(),
            ));
        }

        let now = self.clock.now();
        if appointment.start_time - now > self.policy.join_lead() {
            return Err(ScheduleError::TooEarly(format!(
                "The call will be available {} minutes before the scheduled time",
                self.policy.join_lead_minutes
            )));
        }

        let expires_at = appointment.end_time + self.policy.token_grace();
        let metadata = TokenMetadata {
            account_id: actor.id,
            name: actor.name.clone(),
            role: actor.role,
        };
        let token = self
            .sessions
            .issue_token(&appointment.session_id, SessionRole::Publisher, expires_at, &metadata)
            .await
            .map_err(|e| match e {
                ScheduleError::SessionAllocationFailed(_) => e,
                other => ScheduleError::SessionAllocationFailed(other.to_string()),
            })?;

        self.repo.set_session_token(appointment.id, &token, now).await?;
        debug!("Issued session token for appointment {} to {}", appointment.id, actor.id);

        Ok(JoinAuthorization {
            session_id: appointment.session_id,
            token,
            expires_at,
        })
    }

    /// Replaces the provider's clinical note on one of its appointments.
    pub async fn add_notes(
        &self,
        provider_id: Uuid,
        appointment_id: Uuid,
        notes: &str,
    ) -> ScheduleResult<Appointment> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(ScheduleError::Validation("Notes are required".to_string()));
        }

        let provider = self.load_account(provider_id).await?;
        if !provider.is_provider() {
            return Err(ScheduleError::NotFound(format!(
                "Provider with ID {} not found",
                provider_id
            )));
        }

        let appointment = self.load_appointment(appointment_id).await?;
        if appointment.provider_id != provider.id {
            return Err(ScheduleError::NotFound(format!(
                "Appointment with ID {} not found",
                appointment_id
            )));
        }

        self.repo
            .update_appointment_notes(appointment.id, notes, self.clock.now())
            .await
    }

    /// A provider sees its scheduled appointments, a requester sees all of its own.
    pub async fn list_for(&self, actor_id: Uuid) -> ScheduleResult<Vec<Appointment>> {
        let actor = self.load_account(actor_id).await?;
        match actor.role {
            Role::Provider => {
                self.repo
                    .list_provider_appointments(actor.id, Some(AppointmentStatus::Scheduled))
                    .await
            }
            Role::Requester => self.repo.list_requester_appointments(actor.id).await,
            Role::Admin | Role::Unassigned => Err(ScheduleError::Validation(format!(
                "Accounts with role {} have no appointments",
                actor.role
            ))),
        }
    }

    async fn load_account(&self, account_id: Uuid) -> ScheduleResult<Account> {
        self.repo.find_account(account_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Account with ID {} not found", account_id))
        })
    }

    async fn load_appointment(&self, appointment_id: Uuid) -> ScheduleResult<Appointment> {
        self.repo.find_appointment(appointment_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Appointment with ID {} not found", appointment_id))
        })
    }
}
