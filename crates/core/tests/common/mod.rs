#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use clinicbook_core::{
    clock::ManualClock,
    memory::MemoryStore,
    mock::MockSessionProvider,
    models::{
        account::{Account, ProviderProfile, Role, VerificationStatus},
        appointment::{Appointment, AppointmentStatus},
        availability::{AvailabilityStatus, AvailabilityWindow},
    },
    policy::SchedulingPolicy,
    services::{
        accounts::AccountService, availability::AvailabilityService, booking::BookingService,
        cancellation::CancellationService, lifecycle::AppointmentService,
    },
};
use fake::{Fake, faker::name::en::Name};
use uuid::Uuid;

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn account(role: Role, credits: i64) -> Account {
    Account {
        id: Uuid::new_v4(),
        name: Name().fake(),
        role,
        credits,
        provider: None,
        created_at: at(2024, 1, 1, 0, 0),
    }
}

pub fn provider(status: VerificationStatus) -> Account {
    Account {
        provider: Some(ProviderProfile {
            specialty: "Dermatology".to_string(),
            experience_years: 7,
            credential_url: "https://example.com/credentials.pdf".to_string(),
            description: "Skin things".to_string(),
            verification_status: status,
        }),
        ..account(Role::Provider, 0)
    }
}

pub fn window(provider_id: Uuid, start: NaiveTime, end: NaiveTime) -> AvailabilityWindow {
    AvailabilityWindow {
        id: Uuid::new_v4(),
        provider_id,
        start_time: start,
        end_time: end,
        status: AvailabilityStatus::Available,
        created_at: at(2024, 1, 1, 0, 0),
    }
}

pub fn appointment(
    provider_id: Uuid,
    requester_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        provider_id,
        requester_id,
        start_time: start,
        end_time: end,
        status,
        requester_note: None,
        clinical_note: None,
        session_id: format!("session-{}", Uuid::new_v4()),
        session_token: None,
        created_at: at(2024, 1, 1, 0, 0),
        updated_at: at(2024, 1, 1, 0, 0),
    }
}

/// Session provider mock that hands out distinct handles and tokens.
pub fn sessions() -> MockSessionProvider {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut sessions = MockSessionProvider::new();
    let handles = counter.clone();
    sessions
        .expect_create_session()
        .returning(move || Ok(format!("session-{}", handles.fetch_add(1, Ordering::SeqCst))));
    sessions
        .expect_issue_token()
        .returning(move |session_id, _, _, metadata| {
            Ok(format!("token-{}-{}", session_id, metadata.account_id))
        });
    sessions
}

pub struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub booking: BookingService,
    pub cancellation: CancellationService,
    pub appointments: AppointmentService,
    pub availability: AvailabilityService,
    pub accounts: AccountService,
}

impl Harness {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_sessions(now, sessions())
    }

    pub fn with_sessions(now: DateTime<Utc>, sessions: MockSessionProvider) -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(now));
        let policy = SchedulingPolicy::default();
        let repo = Arc::new(store.clone());
        let sessions = Arc::new(sessions);

        Self {
            booking: BookingService::new(
                repo.clone(),
                sessions.clone(),
                clock.clone(),
                policy.clone(),
            ),
            cancellation: CancellationService::new(repo.clone(), clock.clone(), policy.clone()),
            appointments: AppointmentService::new(
                repo.clone(),
                sessions,
                clock.clone(),
                policy.clone(),
            ),
            availability: AvailabilityService::new(repo.clone(), clock.clone(), &policy)
                .expect("default policy is valid"),
            accounts: AccountService::new(repo, clock.clone()),
            store,
            clock,
        }
    }

    pub async fn seed_account(&self, account: Account) -> Account {
        self.store.insert_account(account.clone()).await;
        account
    }

    /// A verified provider with a 09:00-17:00 window and a requester holding `credits`.
    pub async fn seed_pair(&self, credits: i64) -> (Account, Account) {
        let provider = self.seed_account(provider(VerificationStatus::Verified)).await;
        self.store
            .insert_window(window(provider.id, time(9, 0), time(17, 0)))
            .await;
        let requester = self.seed_account(account(Role::Requester, credits)).await;
        (provider, requester)
    }
}
