use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    AppointmentDeduction,
    Allocation,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::AppointmentDeduction => "APPOINTMENT_DEDUCTION",
            TransactionKind::Allocation => "ALLOCATION",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPOINTMENT_DEDUCTION" => Ok(TransactionKind::AppointmentDeduction),
            "ALLOCATION" => Ok(TransactionKind::Allocation),
            other => Err(ScheduleError::Validation(format!(
                "Unknown transaction kind: {}",
                other
            ))),
        }
    }
}

/// Immutable ledger entry. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCreditTransaction {
    pub account_id: Uuid,
    pub amount: i64,
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditHistoryResponse {
    pub balance: i64,
    pub transactions: Vec<CreditTransaction>,
}

/// A provider's take from bookings, read off its own ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsSummary {
    pub provider_id: Uuid,
    /// Credits received for bookings minus credits returned on cancellation.
    pub net_credits: i64,
    pub bookings: usize,
    pub refunds: usize,
    pub completed_appointments: usize,
}
