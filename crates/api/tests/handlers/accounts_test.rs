use axum::http::StatusCode;
use clinicbook_core::models::{
    account::{Account, Role, VerificationStatus},
    credit::{CreditHistoryResponse, CreditTransaction, EarningsSummary, TransactionKind},
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

use crate::test_utils::{TestContext, account, as_caller, at, provider};

#[tokio::test]
async fn test_set_role_provider_starts_pending() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let newcomer = ctx.seed(account(Role::Unassigned, 0)).await;

    let response = as_caller(ctx.server.post("/api/accounts/role"), newcomer.id)
        .json(&json!({
            "role": "PROVIDER",
            "profile": {
                "specialty": "Pediatrics",
                "experience_years": 4,
                "credential_url": "https://example.com/board.pdf",
                "description": "Children's health",
            },
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let account = response.json::<Account>();
    assert_eq!(account.role, Role::Provider);
    assert_eq!(
        account.provider.map(|p| p.verification_status),
        Some(VerificationStatus::Pending)
    );
}

#[rstest]
#[case::missing_profile(json!({ "role": "PROVIDER" }))]
#[case::admin(json!({ "role": "ADMIN" }))]
#[case::blank_specialty(json!({
    "role": "PROVIDER",
    "profile": {
        "specialty": " ",
        "experience_years": 4,
        "credential_url": "https://example.com/board.pdf",
        "description": "Children's health",
    },
}))]
#[tokio::test]
async fn test_set_role_rejects_bad_requests(#[case] payload: Value) {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let newcomer = ctx.seed(account(Role::Unassigned, 0)).await;

    let response = as_caller(ctx.server.post("/api/accounts/role"), newcomer.id)
        .json(&payload)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_reviews_and_verifies_provider() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let admin = ctx.seed(account(Role::Admin, 0)).await;
    let pending = ctx.seed(provider(VerificationStatus::Pending)).await;

    let queue = as_caller(ctx.server.get("/api/admin/providers"), admin.id)
        .await
        .json::<Vec<Account>>();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, pending.id);

    let response = as_caller(
        ctx.server
            .put(&format!("/api/admin/providers/{}/verification", pending.id)),
        admin.id,
    )
    .json(&json!({ "status": "VERIFIED" }))
    .await;
    response.assert_status(StatusCode::OK);

    let verified = as_caller(
        ctx.server
            .get("/api/admin/providers")
            .add_query_param("status", "VERIFIED"),
        admin.id,
    )
    .await
    .json::<Vec<Account>>();
    assert_eq!(verified.len(), 1);

    ctx.server
        .get(&format!("/api/providers/{}", pending.id))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_reject_non_admin() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let requester = ctx.seed(account(Role::Requester, 0)).await;

    let response = as_caller(ctx.server.get("/api/admin/providers"), requester.id).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_allocate_credits_shows_in_history() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let admin = ctx.seed(account(Role::Admin, 0)).await;
    let requester = ctx.seed(account(Role::Requester, 0)).await;

    let response = as_caller(
        ctx.server
            .post(&format!("/api/admin/accounts/{}/credits", requester.id)),
        admin.id,
    )
    .json(&json!({ "amount": 10 }))
    .await;
    response.assert_status(StatusCode::OK);
    let entry = response.json::<CreditTransaction>();
    assert_eq!(entry.kind, TransactionKind::Allocation);
    assert_eq!(entry.amount, 10);

    let history = as_caller(ctx.server.get("/api/accounts/credits"), requester.id)
        .await
        .json::<CreditHistoryResponse>();
    assert_eq!(history.balance, 10);
    assert_eq!(history.transactions, vec![entry]);
}

#[tokio::test]
async fn test_allocate_non_positive_amount_is_bad_request() {
    let ctx = TestContext::new(at(2024, 3, 4, 8, 0));
    let admin = ctx.seed(account(Role::Admin, 0)).await;
    let requester = ctx.seed(account(Role::Requester, 0)).await;

    let response = as_caller(
        ctx.server
            .post(&format!("/api/admin/accounts/{}/credits", requester.id)),
        admin.id,
    )
    .json(&json!({ "amount": 0 }))
    .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_earnings_for_provider() {
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

    let response = as_caller(ctx.server.get("/api/accounts/earnings"), provider.id).await;

    response.assert_status(StatusCode::OK);
    let summary = response.json::<EarningsSummary>();
    assert_eq!(summary.net_credits, 2);
    assert_eq!(summary.bookings, 1);
    assert_eq!(summary.refunds, 0);

    as_caller(ctx.server.get("/api/accounts/earnings"), requester.id)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
