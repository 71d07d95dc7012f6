//! In-process store implementing the repository contract.
//!
//! Every unit of work holds one store-wide async lock from `begin` until commit,
//! rollback or drop, and writes into a staged copy of the state that only replaces
//! the shared state on commit. That gives serializable isolation, which is what the
//! booking and cancellation flows require from any backend.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use eyre::eyre;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    errors::{ScheduleError, ScheduleResult},
    models::{
        account::{Account, ProviderProfile, Role, VerificationStatus},
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        availability::{AvailabilityStatus, AvailabilityWindow},
        credit::{CreditTransaction, NewCreditTransaction},
    },
    repository::{ScheduleRepository, UnitOfWork},
};

#[derive(Debug, Clone, Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    windows: Vec<AvailabilityWindow>,
    appointments: Vec<Appointment>,
    credit_transactions: Vec<CreditTransaction>,
}

impl State {
    fn appointment_mut(&mut self, id: Uuid) -> ScheduleResult<&mut Appointment> {
        self.appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ScheduleError::NotFound(format!("Appointment with ID {} not found", id)))
    }

    fn account_mut(&mut self, id: Uuid) -> ScheduleResult<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| ScheduleError::NotFound(format!("Account with ID {} not found", id)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StorageUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> ScheduleResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ScheduleError::StorageUnavailable(eyre!(
                "memory store marked unavailable"
            )));
        }
        Ok(())
    }

    pub async fn insert_account(&self, account: Account) {
        self.state.lock().await.accounts.insert(account.id, account);
    }

    pub async fn insert_window(&self, window: AvailabilityWindow) {
        self.state.lock().await.windows.push(window);
    }

    /// Seeds an appointment as-is, bypassing the booking flow.
    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.state.lock().await.appointments.push(appointment);
    }

    pub async fn appointment_count(&self) -> usize {
        self.state.lock().await.appointments.len()
    }

    pub async fn credit_transaction_count(&self) -> usize {
        self.state.lock().await.credit_transactions.len()
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn find_account(&self, id: Uuid) -> ScheduleResult<Option<Account>> {
        self.check_available()?;
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn update_account_role(
        &self,
        id: Uuid,
        role: Role,
        profile: Option<ProviderProfile>,
    ) -> ScheduleResult<Account> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let account = state.account_mut(id)?;
        account.role = role;
        account.provider = profile;
        Ok(account.clone())
    }

    async fn set_verification_status(
        &self,
        provider_id: Uuid,
        status: VerificationStatus,
    ) -> ScheduleResult<Account> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let account = state.account_mut(provider_id)?;
        let profile = account.provider.as_mut().ok_or_else(|| {
            ScheduleError::NotFound(format!("Provider with ID {} not found", provider_id))
        })?;
        profile.verification_status = status;
        Ok(account.clone())
    }

    async fn list_providers(&self, status: VerificationStatus) -> ScheduleResult<Vec<Account>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut providers: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| {
                a.role == Role::Provider
                    && a.provider
                        .as_ref()
                        .is_some_and(|p| p.verification_status == status)
            })
            .cloned()
            .collect();
        providers.sort_by_key(|a| a.created_at);
        Ok(providers)
    }

    async fn list_providers_by_specialty(
        &self,
        specialty: &str,
        status: VerificationStatus,
    ) -> ScheduleResult<Vec<Account>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut providers: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| {
                a.role == Role::Provider
                    && a.provider.as_ref().is_some_and(|p| {
                        p.verification_status == status
                            && p.specialty.trim().eq_ignore_ascii_case(specialty.trim())
                    })
            })
            .cloned()
            .collect();
        providers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(providers)
    }

    async fn find_availability(
        &self,
        provider_id: Uuid,
    ) -> ScheduleResult<Option<AvailabilityWindow>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .windows
            .iter()
            .find(|w| w.provider_id == provider_id && w.status == AvailabilityStatus::Available)
            .cloned())
    }

    async fn list_availability(&self, provider_id: Uuid) -> ScheduleResult<Vec<AvailabilityWindow>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut windows: Vec<AvailabilityWindow> = state
            .windows
            .iter()
            .filter(|w| w.provider_id == provider_id)
            .cloned()
            .collect();
        windows.sort_by_key(|w| w.start_time);
        Ok(windows)
    }

    async fn replace_availability(
        &self,
        provider_id: Uuid,
        start_time: NaiveTime,
        end_time: NaiveTime,
        now: DateTime<Utc>,
    ) -> ScheduleResult<AvailabilityWindow> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        // Appointments reference the provider, never a window, so every old window is free to go.
        state.windows.retain(|w| w.provider_id != provider_id);
        let window = AvailabilityWindow {
            id: Uuid::new_v4(),
            provider_id,
            start_time,
            end_time,
            status: AvailabilityStatus::Available,
            created_at: now,
        };
        state.windows.push(window.clone());
        Ok(window)
    }

    async fn find_scheduled_appointments(
        &self,
        provider_id: Uuid,
        before_or_at: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Appointment>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .iter()
            .filter(|a| {
                a.provider_id == provider_id
                    && a.status == AppointmentStatus::Scheduled
                    && a.start_time <= before_or_at
            })
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }

    async fn find_appointment(&self, id: Uuid) -> ScheduleResult<Option<Appointment>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_provider_appointments(
        &self,
        provider_id: Uuid,
        status: Option<AppointmentStatus>,
    ) -> ScheduleResult<Vec<Appointment>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .iter()
            .filter(|a| a.provider_id == provider_id && status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }

    async fn list_requester_appointments(
        &self,
        requester_id: Uuid,
    ) -> ScheduleResult<Vec<Appointment>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .iter()
            .filter(|a| a.requester_id == requester_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }

    async fn update_appointment_notes(
        &self,
        id: Uuid,
        notes: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let appointment = state.appointment_mut(id)?;
        appointment.clinical_note = Some(notes.to_string());
        appointment.updated_at = now;
        Ok(appointment.clone())
    }

    async fn set_session_token(
        &self,
        id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let appointment = state.appointment_mut(id)?;
        appointment.session_token = Some(token.to_string());
        appointment.updated_at = now;
        Ok(appointment.clone())
    }

    async fn list_credit_transactions(
        &self,
        account_id: Uuid,
    ) -> ScheduleResult<Vec<CreditTransaction>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .credit_transactions
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> ScheduleResult<Box<dyn UnitOfWork>> {
        self.check_available()?;
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            staged,
            unavailable: self.unavailable.clone(),
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<State>,
    staged: State,
    unavailable: Arc<AtomicBool>,
}

impl MemoryUnitOfWork {
    fn check_available(&self) -> ScheduleResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ScheduleError::StorageUnavailable(eyre!(
                "memory store marked unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_provider_schedule(&mut self, provider_id: Uuid) -> ScheduleResult<()> {
        // The store-wide guard is already held.
        self.check_available()?;
        if !self.staged.accounts.contains_key(&provider_id) {
            return Err(ScheduleError::NotFound(format!(
                "Provider with ID {} not found",
                provider_id
            )));
        }
        Ok(())
    }

    async fn find_overlapping(
        &mut self,
        provider_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ScheduleResult<Option<Appointment>> {
        self.check_available()?;
        Ok(self
            .staged
            .appointments
            .iter()
            .find(|a| {
                a.provider_id == provider_id
                    && a.status == AppointmentStatus::Scheduled
                    && a.overlaps(start, end)
            })
            .cloned())
    }

    async fn find_appointment_for_update(
        &mut self,
        id: Uuid,
    ) -> ScheduleResult<Option<Appointment>> {
        self.check_available()?;
        Ok(self.staged.appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn insert_appointment(
        &mut self,
        appointment: &NewAppointment,
    ) -> ScheduleResult<Appointment> {
        self.check_available()?;
        let appointment = Appointment {
            id: Uuid::new_v4(),
            provider_id: appointment.provider_id,
            requester_id: appointment.requester_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: AppointmentStatus::Scheduled,
            requester_note: appointment.requester_note.clone(),
            clinical_note: None,
            session_id: appointment.session_id.clone(),
            session_token: None,
            created_at: appointment.created_at,
            updated_at: appointment.created_at,
        };
        self.staged.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment_status(
        &mut self,
        id: Uuid,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Appointment> {
        self.check_available()?;
        let appointment = self.staged.appointment_mut(id)?;
        appointment.status = status;
        appointment.updated_at = now;
        Ok(appointment.clone())
    }

    async fn balance_for_update(&mut self, account_id: Uuid) -> ScheduleResult<Option<i64>> {
        self.check_available()?;
        Ok(self.staged.accounts.get(&account_id).map(|a| a.credits))
    }

    async fn record_credit(
        &mut self,
        entry: &NewCreditTransaction,
    ) -> ScheduleResult<CreditTransaction> {
        self.check_available()?;
        let account = self.staged.account_mut(entry.account_id)?;
        let balance = account.credits + entry.amount;
        if balance < 0 {
            return Err(ScheduleError::InsufficientCredits {
                balance: account.credits,
                required: -entry.amount,
            });
        }
        account.credits = balance;
        let transaction = CreditTransaction {
            id: Uuid::new_v4(),
            account_id: entry.account_id,
            amount: entry.amount,
            kind: entry.kind,
            created_at: entry.created_at,
        };
        self.staged.credit_transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn commit(self: Box<Self>) -> ScheduleResult<()> {
        self.check_available()?;
        let MemoryUnitOfWork {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> ScheduleResult<()> {
        Ok(())
    }
}
