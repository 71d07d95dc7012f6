use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    errors::{ScheduleError, ScheduleResult},
    models::{
        account::{Account, ProviderProfile, Role, SetRoleRequest, VerificationStatus},
        appointment::AppointmentStatus,
        credit::{CreditHistoryResponse, CreditTransaction, EarningsSummary, TransactionKind},
    },
    repository::{ScheduleRepository, finish},
    services::ledger::CreditLedger,
};

/// Onboarding, provider verification and credit administration.
pub struct AccountService {
    repo: Arc<dyn ScheduleRepository>,
    clock: Arc<dyn Clock>,
    ledger: CreditLedger,
}

impl AccountService {
    pub fn new(repo: Arc<dyn ScheduleRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            ledger: CreditLedger::new(),
        }
    }

    /// Chooses the account's role. A provider must supply a complete profile and
    /// starts out `PENDING` verification.
    pub async fn set_role(&self, account_id: Uuid, request: &SetRoleRequest) -> ScheduleResult<Account> {
        self.load_account(account_id).await?;

        let profile = match request.role {
            Role::Requester => None,
            Role::Provider => {
                let profile = request.profile.as_ref().ok_or_else(|| {
                    ScheduleError::Validation("Provider profile is required".to_string())
                })?;
                if profile.specialty.trim().is_empty()
                    || profile.experience_years <= 0
                    || profile.credential_url.trim().is_empty()
                    || profile.description.trim().is_empty()
                {
                    return Err(ScheduleError::Validation("All fields are required".to_string()));
                }
                Some(ProviderProfile {
                    specialty: profile.specialty.trim().to_string(),
                    experience_years: profile.experience_years,
                    credential_url: profile.credential_url.trim().to_string(),
                    description: profile.description.trim().to_string(),
                    verification_status: VerificationStatus::Pending,
                })
            }
            Role::Admin | Role::Unassigned => {
                return Err(ScheduleError::Validation("Invalid role selection".to_string()));
            }
        };

        let account = self
            .repo
            .update_account_role(account_id, request.role, profile)
            .await?;
        info!("Account {} onboarded as {}", account.id, account.role);
        Ok(account)
    }

    pub async fn list_providers(
        &self,
        admin_id: Uuid,
        status: VerificationStatus,
    ) -> ScheduleResult<Vec<Account>> {
        self.require_admin(admin_id).await?;
        self.repo.list_providers(status).await
    }

    pub async fn set_verification(
        &self,
        admin_id: Uuid,
        provider_id: Uuid,
        status: VerificationStatus,
    ) -> ScheduleResult<Account> {
        self.require_admin(admin_id).await?;

        let provider = self.load_account(provider_id).await?;
        if !provider.is_provider() {
            return Err(ScheduleError::NotFound(format!(
                "Provider with ID {} not found",
                provider_id
            )));
        }

        let provider = self.repo.set_verification_status(provider_id, status).await?;
        info!("Provider {} verification set to {}", provider.id, status);
        Ok(provider)
    }

    pub async fn allocate_credits(
        &self,
        admin_id: Uuid,
        account_id: Uuid,
        amount: i64,
    ) -> ScheduleResult<CreditTransaction> {
        self.require_admin(admin_id).await?;

        let mut uow = self.repo.begin().await?;
        let outcome = self
            .ledger
            .allocate(uow.as_mut(), account_id, amount, self.clock.now())
            .await;
        finish(uow, outcome).await
    }

    pub async fn credit_history(&self, account_id: Uuid) -> ScheduleResult<CreditHistoryResponse> {
        let account = self.load_account(account_id).await?;
        let transactions = self.repo.list_credit_transactions(account.id).await?;
        Ok(CreditHistoryResponse {
            balance: account.credits,
            transactions,
        })
    }

    /// Earnings of a provider from its `APPOINTMENT_DEDUCTION` entries. Allocations
    /// are grants, not earnings, and are left out.
    pub async fn earnings(&self, provider_id: Uuid) -> ScheduleResult<EarningsSummary> {
        let provider = self.load_account(provider_id).await?;
        if !provider.is_provider() {
            return Err(ScheduleError::NotFound(format!(
                "Provider with ID {} not found",
                provider_id
            )));
        }

        let entries = self.repo.list_credit_transactions(provider.id).await?;
        let booking_entries: Vec<_> = entries
            .into_iter()
            .filter(|e| e.kind == TransactionKind::AppointmentDeduction)
            .collect();
        let completed = self
            .repo
            .list_provider_appointments(provider.id, Some(AppointmentStatus::Completed))
            .await?;

        Ok(EarningsSummary {
            provider_id: provider.id,
            net_credits: CreditLedger::balance_of(&booking_entries),
            bookings: booking_entries.iter().filter(|e| e.amount > 0).count(),
            refunds: booking_entries.iter().filter(|e| e.amount < 0).count(),
            completed_appointments: completed.len(),
        })
    }

    async fn require_admin(&self, account_id: Uuid) -> ScheduleResult<Account> {
        let account = self.load_account(account_id).await?;
        if !account.is_admin() {
            warn!("Account {} attempted an admin operation", account_id);
            return Err(ScheduleError::Unauthorized(
                "Admin privileges required".to_string(),
            ));
        }
        Ok(account)
    }

    async fn load_account(&self, account_id: Uuid) -> ScheduleResult<Account> {
        self.repo.find_account(account_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Account with ID {} not found", account_id))
        })
    }
}
