use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    errors::{ScheduleError, ScheduleResult},
    models::credit::{CreditTransaction, NewCreditTransaction, TransactionKind},
    repository::UnitOfWork,
};

/// Both legs of a ledger transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub debit: CreditTransaction,
    pub credit: CreditTransaction,
}

/// Moves credits between accounts. Balances are only ever changed through here,
/// always inside the caller's unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditLedger;

impl CreditLedger {
    pub fn new() -> Self {
        Self
    }

    /// Zero-sum transfer of `amount` from one account to another, recorded as two
    /// entries with the same kind. Fails with `InsufficientCredits` if the source
    /// balance would go negative.
    pub async fn transfer(
        &self,
        uow: &mut dyn UnitOfWork,
        from: Uuid,
        to: Uuid,
        amount: i64,
        kind: TransactionKind,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Transfer> {
        if amount <= 0 {
            return Err(ScheduleError::Validation(format!(
                "Transfer amount must be positive, got {}",
                amount
            )));
        }
        if from == to {
            return Err(ScheduleError::Validation(
                "Cannot transfer credits to the same account".to_string(),
            ));
        }

        // Lock in id order so opposite transfers between the same pair cannot deadlock.
        let (first, second) = if from < to { (from, to) } else { (to, from) };
        let first_balance = self.locked_balance(uow, first).await?;
        let second_balance = self.locked_balance(uow, second).await?;
        let from_balance = if first == from {
            first_balance
        } else {
            second_balance
        };

        if from_balance < amount {
            warn!(
                "Transfer of {} from {} rejected: balance {}",
                amount, from, from_balance
            );
            return Err(ScheduleError::InsufficientCredits {
                balance: from_balance,
                required: amount,
            });
        }

        let debit = uow
            .record_credit(&NewCreditTransaction {
                account_id: from,
                amount: -amount,
                kind,
                created_at: now,
            })
            .await?;
        let credit = uow
            .record_credit(&NewCreditTransaction {
                account_id: to,
                amount,
                kind,
                created_at: now,
            })
            .await?;

        info!("Transferred {} credits from {} to {} ({})", amount, from, to, kind);
        Ok(Transfer { debit, credit })
    }

    /// Grants `amount` new credits to an account.
    pub async fn allocate(
        &self,
        uow: &mut dyn UnitOfWork,
        account_id: Uuid,
        amount: i64,
        now: DateTime<Utc>,
    ) -> ScheduleResult<CreditTransaction> {
        if amount <= 0 {
            return Err(ScheduleError::Validation(format!(
                "Allocation amount must be positive, got {}",
                amount
            )));
        }

        self.locked_balance(uow, account_id).await?;
        let entry = uow
            .record_credit(&NewCreditTransaction {
                account_id,
                amount,
                kind: TransactionKind::Allocation,
                created_at: now,
            })
            .await?;

        info!("Allocated {} credits to {}", amount, account_id);
        Ok(entry)
    }

    /// Balance as the running sum of an account's entries.
    pub fn balance_of(entries: &[CreditTransaction]) -> i64 {
        entries.iter().map(|e| e.amount).sum()
    }

    async fn locked_balance(&self, uow: &mut dyn UnitOfWork, account_id: Uuid) -> ScheduleResult<i64> {
        let balance = uow.balance_for_update(account_id).await?.ok_or_else(|| {
            ScheduleError::NotFound(format!("Account with ID {} not found", account_id))
        })?;
        debug!("Locked balance of {}: {}", account_id, balance);
        Ok(balance)
    }
}
