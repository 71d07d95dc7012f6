use std::collections::HashMap;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use chrono_tz::Tz;
use clinicbook_api::{config::ApiConfig, middleware::error_handling::map_error};
use clinicbook_core::errors::ScheduleError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;
use tracing::Level;
use uuid::Uuid;

use crate::test_utils::{TestContext, at};

#[rstest]
#[case::unauthorized(ScheduleError::Unauthorized("no".into()), 401)]
#[case::not_found(ScheduleError::NotFound("gone".into()), 404)]
#[case::not_configured(ScheduleError::NotConfigured(Uuid::nil()), 404)]
#[case::validation(ScheduleError::Validation("bad".into()), 400)]
#[case::conflict(ScheduleError::SlotConflict { start: at(2024, 3, 4, 9, 0), end: at(2024, 3, 4, 9, 30) }, 409)]
#[case::insufficient(ScheduleError::InsufficientCredits { balance: 1, required: 2 }, 402)]
#[case::invalid_state(ScheduleError::InvalidState("done".into()), 409)]
#[case::too_early(ScheduleError::TooEarly("wait".into()), 425)]
#[case::session(ScheduleError::SessionAllocationFailed("down".into()), 502)]
#[case::storage(ScheduleError::StorageUnavailable(eyre::eyre!("pool timed out")), 503)]
fn test_error_status_mapping(#[case] error: ScheduleError, #[case] status: u16) {
    let response = map_error(error);

    assert_eq!(response.status().as_u16(), status);
}

#[tokio::test]
async fn test_storage_details_are_not_exposed() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, _) = ctx.seed_pair(0).await;
    ctx.store.set_unavailable(true);

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/slots", provider.id))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Storage unavailable, please retry");
    assert_eq!(body["retryable"], true);
}

#[rstest]
#[case::not_a_uuid("patient-17")]
#[case::empty("")]
#[tokio::test]
async fn test_malformed_identity_is_unauthorized(#[case] raw: &'static str) {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));

    let response = ctx
        .server
        .get("/api/appointments")
        .add_header(
            HeaderName::from_static("x-account-id"),
            HeaderValue::from_static(raw),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_caller_is_not_found() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));

    let response = ctx
        .server
        .get("/api/accounts/credits")
        .add_header(
            HeaderName::from_static("x-account-id"),
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        )
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_version() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));

    ctx.server.get("/health").await.assert_status_ok();

    let version = ctx.server.get("/version").await.json::<Value>();
    assert_eq!(version["timezone"], "UTC");
    assert_eq!(version["slot_minutes"], 30);
    assert_eq!(version["booking_cost"], 2);
}

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let config = ApiConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/clinic")]))
        .unwrap();

    assert_eq!(config.server_addr(), "0.0.0.0:3000");
    assert_eq!(config.log_level, Level::INFO);
    assert_eq!(config.request_timeout, 30);
    assert!(config.cors_origins.is_none());
    assert_eq!(config.policy.slot_minutes, 30);
    assert_eq!(config.policy.horizon_days, 4);
    assert_eq!(config.policy.timezone, Tz::UTC);
}

#[test]
fn test_config_reads_policy_and_origins() {
    let config = ApiConfig::from_lookup(lookup(&[
        ("DATABASE_URL", "postgres://localhost/clinic"),
        ("API_PORT", "8080"),
        ("LOG_LEVEL", "debug"),
        ("API_CORS_ORIGINS", "https://a.example.com, https://b.example.com,"),
        ("SLOT_MINUTES", "15"),
        ("BOOKING_COST", "3"),
        ("SCHEDULE_TIMEZONE", "America/New_York"),
    ]))
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.log_level, Level::DEBUG);
    assert_eq!(
        config.cors_origins,
        Some(vec![
            "https://a.example.com".to_string(),
            "https://b.example.com".to_string()
        ])
    );
    assert_eq!(config.policy.slot_minutes, 15);
    assert_eq!(config.policy.booking_cost, 3);
    assert_eq!(config.policy.timezone, Tz::America__New_York);
}

#[rstest]
#[case::missing_database(&[])]
#[case::bad_port(&[("DATABASE_URL", "postgres://x"), ("API_PORT", "eighty")])]
#[case::zero_slot(&[("DATABASE_URL", "postgres://x"), ("SLOT_MINUTES", "0")])]
#[case::free_booking(&[("DATABASE_URL", "postgres://x"), ("BOOKING_COST", "-1")])]
#[case::bad_timezone(&[("DATABASE_URL", "postgres://x"), ("SCHEDULE_TIMEZONE", "Mars/Olympus")])]
fn test_config_rejects_invalid_values(#[case] vars: &[(&str, &str)]) {
    assert!(ApiConfig::from_lookup(lookup(vars)).is_err());
}
