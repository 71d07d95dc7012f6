use chrono::{DateTime, NaiveTime, Utc};
use clinicbook_core::models::{
    account::{Account, ProviderProfile, Role},
    appointment::Appointment,
    availability::AvailabilityWindow,
    credit::CreditTransaction,
};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub credits: i64,
    pub specialty: Option<String>,
    pub experience_years: Option<i32>,
    pub credential_url: Option<String>,
    pub description: Option<String>,
    pub verification_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailability {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub requester_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub requester_note: Option<String>,
    pub clinical_note: Option<String>,
    pub session_id: String,
    pub session_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCreditTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbAccount> for Account {
    type Error = eyre::Report;

    fn try_from(row: DbAccount) -> Result<Self> {
        let role: Role = row.role.parse()?;

        // Profile columns are only meaningful on provider rows.
        let provider = match (role, row.verification_status) {
            (Role::Provider, Some(status)) => Some(ProviderProfile {
                specialty: row.specialty.unwrap_or_default(),
                experience_years: row.experience_years.unwrap_or_default(),
                credential_url: row.credential_url.unwrap_or_default(),
                description: row.description.unwrap_or_default(),
                verification_status: status.parse()?,
            }),
            (Role::Provider, None) => {
                return Err(eyre!("Provider account {} has no verification status", row.id));
            }
            _ => None,
        };

        Ok(Account {
            id: row.id,
            name: row.name,
            role,
            credits: row.credits,
            provider,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbAvailability> for AvailabilityWindow {
    type Error = eyre::Report;

    fn try_from(row: DbAvailability) -> Result<Self> {
        Ok(AvailabilityWindow {
            id: row.id,
            provider_id: row.provider_id,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = eyre::Report;

    fn try_from(row: DbAppointment) -> Result<Self> {
        Ok(Appointment {
            id: row.id,
            provider_id: row.provider_id,
            requester_id: row.requester_id,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status.parse()?,
            requester_note: row.requester_note,
            clinical_note: row.clinical_note,
            session_id: row.session_id,
            session_token: row.session_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbCreditTransaction> for CreditTransaction {
    type Error = eyre::Report;

    fn try_from(row: DbCreditTransaction) -> Result<Self> {
        Ok(CreditTransaction {
            id: row.id,
            account_id: row.account_id,
            amount: row.amount,
            kind: row.kind.parse()?,
            created_at: row.created_at,
        })
    }
}

/// Converts a batch of rows, failing on the first one that does not parse.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = eyre::Report>,
{
    rows.into_iter().map(T::try_from).collect()
}
