use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/accounts/role", post(handlers::accounts::set_role))
        .route(
            "/api/accounts/credits",
            get(handlers::accounts::credit_history),
        )
        .route("/api/accounts/earnings", get(handlers::accounts::earnings))
}
