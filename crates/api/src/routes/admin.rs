use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/admin/providers", get(handlers::admin::list_providers))
        .route(
            "/api/admin/providers/:id/verification",
            put(handlers::admin::set_verification),
        )
        .route(
            "/api/admin/accounts/:id/credits",
            post(handlers::admin::allocate_credits),
        )
}
