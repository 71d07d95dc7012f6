use axum::{Router, routing::get};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/providers",
            get(handlers::availability::list_providers_by_specialty),
        )
        .route(
            "/api/providers/:id",
            get(handlers::availability::get_provider),
        )
        .route(
            "/api/providers/:id/slots",
            get(handlers::availability::available_slots),
        )
        .route(
            "/api/availability",
            get(handlers::availability::get_availability).put(handlers::availability::set_availability),
        )
}
