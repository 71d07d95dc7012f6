use axum::http::StatusCode;
use chrono::Duration;
use clinicbook_core::{
    errors::ScheduleError,
    mock::MockSessionProvider,
    models::{
        account::Role,
        appointment::{Appointment, AppointmentStatus, JoinAuthorization},
        credit::CreditHistoryResponse,
    },
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, account, as_caller, at};

async fn book(
    ctx: &TestContext,
    requester_id: Uuid,
    provider_id: Uuid,
    hour: u32,
) -> axum_test::TestResponse {
    as_caller(ctx.server.post("/api/appointments"), requester_id)
        .json(&json!({
            "provider_id": provider_id,
            "start": at(2024, 3, 4, hour, 0),
            "end": at(2024, 3, 4, hour, 30),
            "note": "Recurring chest pain",
        }))
        .await
}

#[test_log::test(tokio::test)]
async fn test_book_appointment_moves_credits() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;

    let response = book(&ctx, requester.id, provider.id, 10).await;

    response.assert_status(StatusCode::CREATED);
    let appointment = response.json::<Appointment>();
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.session_id, "room-0");
    assert_eq!(
        appointment.requester_note.as_deref(),
        Some("Recurring chest pain")
    );

    let requester_history = as_caller(ctx.server.get("/api/accounts/credits"), requester.id)
        .await
        .json::<CreditHistoryResponse>();
    let provider_history = as_caller(ctx.server.get("/api/accounts/credits"), provider.id)
        .await
        .json::<CreditHistoryResponse>();
    assert_eq!(requester_history.balance, 3);
    assert_eq!(provider_history.balance, 2);
}

#[tokio::test]
async fn test_book_overlapping_slot_conflicts() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(10).await;

    book(&ctx, requester.id, provider.id, 10)
        .await
        .assert_status(StatusCode::CREATED);
    let response = book(&ctx, requester.id, provider.id, 10).await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(ctx.store.appointment_count().await, 1);
}

#[tokio::test]
async fn test_book_without_credits_is_payment_required() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(1).await;

    let response = book(&ctx, requester.id, provider.id, 10).await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body = response.json::<Value>();
    assert_eq!(
        body["error"],
        "Insufficient credits: balance 1, required 2"
    );
    assert_eq!(ctx.store.credit_transaction_count().await, 0);
}

#[tokio::test]
async fn test_book_session_failure_is_bad_gateway() {
    let mut sessions = MockSessionProvider::new();
    sessions.expect_create_session().returning(|| {
        Err(ScheduleError::SessionAllocationFailed(
            "host returned 503".to_string(),
        ))
    });
    let ctx = TestContext::with_sessions(at(2024, 3, 4, 8, 0), sessions);
    let (provider, requester) = ctx.seed_pair(5).await;

    let response = book(&ctx, requester.id, provider.id, 10).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["retryable"], true);
    assert_eq!(ctx.store.appointment_count().await, 0);
    assert_eq!(ctx.store.credit_transaction_count().await, 0);
}

#[tokio::test]
async fn test_book_requires_identity() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, _) = ctx.seed_pair(0).await;

    let response = ctx
        .server
        .post("/api/appointments")
        .json(&json!({
            "provider_id": provider.id,
            "start": at(2024, 3, 4, 10, 0),
            "end": at(2024, 3, 4, 10, 30),
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cancel_refunds_and_rejects_repeat() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;
    let booked = book(&ctx, requester.id, provider.id, 10)
        .await
        .json::<Appointment>();
    let path = format!("/api/appointments/{}/cancel", booked.id);

    let response = as_caller(ctx.server.post(&path), requester.id).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json::<Appointment>().status,
        AppointmentStatus::Cancelled
    );

    let history = as_caller(ctx.server.get("/api/accounts/credits"), requester.id)
        .await
        .json::<CreditHistoryResponse>();
    assert_eq!(history.balance, 5);
    assert_eq!(history.transactions.len(), 2);

    as_caller(ctx.server.post(&path), requester.id)
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_by_outsider_is_unauthorized() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;
    let outsider = ctx.seed(account(Role::Requester, 5)).await;
    let booked = book(&ctx, requester.id, provider.id, 10)
        .await
        .json::<Appointment>();

    let response = as_caller(
        ctx.server
            .post(&format!("/api/appointments/{}/cancel", booked.id)),
        outsider.id,
    )
    .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_join_window_opens_before_start() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;
    let booked = book(&ctx, requester.id, provider.id, 10)
        .await
        .json::<Appointment>();
    let path = format!("/api/appointments/{}/join", booked.id);

    let early = as_caller(ctx.server.post(&path), provider.id).await;
    early.assert_status(StatusCode::from_u16(425).unwrap());

    ctx.clock.set(at(2024, 3, 4, 9, 30));
    let response = as_caller(ctx.server.post(&path), provider.id).await;

    response.assert_status(StatusCode::OK);
    let authorization = response.json::<JoinAuthorization>();
    assert_eq!(authorization.session_id, "room-0");
    assert_eq!(
        authorization.token,
        format!("token-room-0-{}", provider.id)
    );
    assert_eq!(authorization.expires_at, at(2024, 3, 4, 10, 30) + Duration::minutes(60));
}

#[tokio::test]
async fn test_complete_after_end() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;
    let booked = book(&ctx, requester.id, provider.id, 10)
        .await
        .json::<Appointment>();
    let path = format!("/api/appointments/{}/complete", booked.id);

    as_caller(ctx.server.post(&path), provider.id)
        .await
        .assert_status(StatusCode::from_u16(425).unwrap());

    ctx.clock.set(at(2024, 3, 4, 10, 30));
    let response = as_caller(ctx.server.post(&path), provider.id).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json::<Appointment>().status,
        AppointmentStatus::Completed
    );

    // Providers only list scheduled appointments.
    let listed = as_caller(ctx.server.get("/api/appointments"), provider.id)
        .await
        .json::<Vec<Appointment>>();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_add_notes_and_list_for_requester() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;
    let booked = book(&ctx, requester.id, provider.id, 11)
        .await
        .json::<Appointment>();

    let response = as_caller(
        ctx.server
            .put(&format!("/api/appointments/{}/notes", booked.id)),
        provider.id,
    )
    .json(&json!({ "notes": "  Follow up in two weeks  " }))
    .await;
    response.assert_status(StatusCode::OK);

    let listed = as_caller(ctx.server.get("/api/appointments"), requester.id)
        .await
        .json::<Vec<Appointment>>();
    assert_eq!(listed.len(), 1);
    assert_eq!(
        listed[0].clinical_note.as_deref(),
        Some("Follow up in two weeks")
    );
}

#[tokio::test]
async fn test_add_notes_rejects_blank() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let (provider, requester) = ctx.seed_pair(5).await;
    let booked = book(&ctx, requester.id, provider.id, 11)
        .await
        .json::<Appointment>();

    let response = as_caller(
        ctx.server
            .put(&format!("/api/appointments/{}/notes", booked.id)),
        provider.id,
    )
    .json(&json!({ "notes": "   " }))
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
