use axum::http::StatusCode;
use clinicbook_core::models::{
    account::{ProviderResponse, VerificationStatus},
    appointment::{Appointment, AppointmentStatus},
    availability::{AvailabilityWindow, AvailableSlotsResponse},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_caller, at, provider};

#[tokio::test]
async fn test_get_provider_returns_public_profile() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, _) = ctx.seed_pair(5).await;

    let response = ctx.server.get(&format!("/api/providers/{}", provider.id)).await;

    response.assert_status(StatusCode::OK);
    let body = response.json::<ProviderResponse>();
    assert_eq!(body.id, provider.id);
    assert_eq!(body.specialty, "Cardiology");
    assert_eq!(body.experience_years, 12);
}

#[tokio::test]
async fn test_get_provider_hides_pending_provider() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let pending = ctx.seed(provider(VerificationStatus::Pending)).await;

    let response = ctx.server.get(&format!("/api/providers/{}", pending.id)).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_available_slots_excludes_booked_slot() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;

    as_caller(ctx.server.post("/api/appointments"), requester.id)
        .json(&json!({
            "provider_id": provider.id,
            "start": at(2024, 3, 4, 10, 0),
            "end": at(2024, 3, 4, 10, 30),
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/slots", provider.id))
        .await;

    response.assert_status(StatusCode::OK);
    let body = response.json::<AvailableSlotsResponse>();
    assert_eq!(body.days.len(), 4);
    assert_eq!(body.days[0].date, "2024-03-04");
    assert_eq!(body.days[0].display_date, "Monday, March 4");
    assert_eq!(body.days[0].slots.len(), 15);
    assert_eq!(body.days[1].slots.len(), 16);
    assert!(
        body.days[0]
            .slots
            .iter()
            .all(|slot| slot.start_time != at(2024, 3, 4, 10, 0))
    );
}

#[tokio::test]
async fn test_available_slots_without_window_is_not_found() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let bare = ctx.seed(provider(VerificationStatus::Verified)).await;

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/slots", bare.id))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(
        body["error"],
        format!("Availability not configured for provider {}", bare.id)
    );
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_set_availability_replaces_window() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, _) = ctx.seed_pair(0).await;

    let response = as_caller(ctx.server.put("/api/availability"), provider.id)
        .json(&json!({ "start_time": "13:00:00", "end_time": "15:00:00" }))
        .await;
    response.assert_status(StatusCode::OK);

    let windows = as_caller(ctx.server.get("/api/availability"), provider.id)
        .await
        .json::<Vec<AvailabilityWindow>>();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].start_time.to_string(), "13:00:00");

    let slots = ctx
        .server
        .get(&format!("/api/providers/{}/slots", provider.id))
        .await
        .json::<AvailableSlotsResponse>();
    assert_eq!(slots.days[0].slots.len(), 4);
    assert_eq!(slots.days[0].slots[0].formatted, "1:00 PM - 1:30 PM");
}

#[tokio::test]
async fn test_set_availability_rejects_inverted_window() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, _) = ctx.seed_pair(0).await;

    let response = as_caller(ctx.server.put("/api/availability"), provider.id)
        .json(&json!({ "start_time": "17:00:00", "end_time": "09:00:00" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_availability_requires_provider() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (_, requester) = ctx.seed_pair(5).await;

    let response = as_caller(ctx.server.put("/api/availability"), requester.id)
        .json(&json!({ "start_time": "09:00:00", "end_time": "10:00:00" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancelled_booking_frees_slot_again() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;

    let booked = as_caller(ctx.server.post("/api/appointments"), requester.id)
        .json(&json!({
            "provider_id": provider.id,
            "start": at(2024, 3, 4, 9, 0),
            "end": at(2024, 3, 4, 9, 30),
        }))
        .await
        .json::<Appointment>();
    as_caller(
        ctx.server
            .post(&format!("/api/appointments/{}/cancel", booked.id)),
        requester.id,
    )
    .await
    .assert_status(StatusCode::OK);

    let slots = ctx
        .server
        .get(&format!("/api/providers/{}/slots", provider.id))
        .await
        .json::<AvailableSlotsResponse>();
    assert_eq!(slots.days[0].slots.len(), 16);
    assert_eq!(booked.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_unknown_provider_is_not_found() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));

    let response = ctx
        .server
        .get(&format!("/api/providers/{}/slots", Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_providers_by_specialty() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (verified, _) = ctx.seed_pair(0).await;
    ctx.seed(provider(VerificationStatus::Pending)).await;

    let response = ctx
        .server
        .get("/api/providers")
        .add_query_param("specialty", "cardiology")
        .await;

    response.assert_status(StatusCode::OK);
    let providers = response.json::<Vec<ProviderResponse>>();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].id, verified.id);
    assert_eq!(providers[0].specialty, "Cardiology");
}

#[tokio::test]
async fn test_list_providers_by_blank_specialty_is_bad_request() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));

    let response = ctx
        .server
        .get("/api/providers")
        .add_query_param("specialty", " ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_availability_as_requester_is_not_found() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (_, requester) = ctx.seed_pair(5).await;

    let response = as_caller(ctx.server.get("/api/availability"), requester.id).await;

    response.assert_status(StatusCode::NOT_FOUND);
}
