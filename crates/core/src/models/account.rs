use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Unassigned,
    Requester,
    Provider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unassigned => "UNASSIGNED",
            Role::Requester => "REQUESTER",
            Role::Provider => "PROVIDER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNASSIGNED" => Ok(Role::Unassigned),
            "REQUESTER" => Ok(Role::Requester),
            "PROVIDER" => Ok(Role::Provider),
            "ADMIN" => Ok(Role::Admin),
            other => Err(ScheduleError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(VerificationStatus::Pending),
            "VERIFIED" => Ok(VerificationStatus::Verified),
            "REJECTED" => Ok(VerificationStatus::Rejected),
            other => Err(ScheduleError::Validation(format!(
                "Unknown verification status: {}",
                other
            ))),
        }
    }
}

/// Attributes only a provider carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub specialty: String,
    pub experience_years: i32,
    pub credential_url: String,
    pub description: String,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    /// Cached balance. Only the credit ledger changes it.
    pub credits: i64,
    pub provider: Option<ProviderProfile>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_requester(&self) -> bool {
        self.role == Role::Requester
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_provider(&self) -> bool {
        self.role == Role::Provider
    }

    /// Only verified providers can be booked or listed to requesters.
    pub fn is_schedulable_provider(&self) -> bool {
        self.is_provider()
            && self
                .provider
                .as_ref()
                .is_some_and(|p| p.verification_status == VerificationStatus::Verified)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfileRequest {
    pub specialty: String,
    pub experience_years: i32,
    pub credential_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
    pub profile: Option<ProviderProfileRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVerificationRequest {
    pub status: VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateCreditsRequest {
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub experience_years: i32,
    pub description: String,
}

impl ProviderResponse {
    pub fn from_account(account: &Account) -> Option<Self> {
        let profile = account.provider.as_ref()?;
        Some(Self {
            id: account.id,
            name: account.name.clone(),
            specialty: profile.specialty.clone(),
            experience_years: profile.experience_years,
            description: profile.description.clone(),
        })
    }
}
