//! # Clinicbook API
//!
//! The API crate provides the web server for the clinicbook consultation scheduler.
//! It exposes booking, cancellation, session joins, availability and account
//! administration over JSON.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate requests into service calls
//! - **Middleware**: Caller identity and error mapping
//! - **Config**: Environment and scheduling policy configuration
//!
//! All scheduling rules live in `clinicbook-core`; handlers only translate.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Identity extraction and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Method, StatusCode, header},
};
use clinicbook_core::{
    clock::Clock,
    errors::ScheduleResult,
    policy::SchedulingPolicy,
    repository::ScheduleRepository,
    services::{
        accounts::AccountService, availability::AvailabilityService, booking::BookingService,
        cancellation::CancellationService, lifecycle::AppointmentService,
    },
    session::SessionProvider,
};
use eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use middleware::identity::ACCOUNT_ID_HEADER;

/// Shared application state that is accessible to all request handlers
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(ApiState::new(repo, sessions, clock, policy)?);
/// let app = build_router(state);
/// ```
pub struct ApiState {
    pub booking: BookingService,
    pub cancellation: CancellationService,
    pub appointments: AppointmentService,
    pub availability: AvailabilityService,
    pub accounts: AccountService,
    pub policy: SchedulingPolicy,
}

impl ApiState {
    /// Wires every service against the same repository, session provider and clock.
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        sessions: Arc<dyn SessionProvider>,
        clock: Arc<dyn Clock>,
        policy: SchedulingPolicy,
    ) -> ScheduleResult<Self> {
        Ok(Self {
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
            availability: AvailabilityService::new(repo.clone(), clock.clone(), &policy)?,
            accounts: AccountService::new(repo, clock),
            policy,
        })
    }
}

/// Builds the application router with all routes and request tracing.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Provider browsing and availability endpoints
        .merge(routes::availability::routes())
        // Appointment lifecycle endpoints
        .merge(routes::appointments::routes())
        // Onboarding and credit history endpoints
        .merge(routes::accounts::routes())
        // Admin endpoints
        .merge(routes::admin::routes())
        // Attach shared state to all routes
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .wrap_err_with(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static(ACCOUNT_ID_HEADER),
        ])
        .allow_origin(origins)
        .allow_credentials(true))
}

/// Starts the API server with the provided configuration and application state
///
/// Initializes logging, applies CORS and the request timeout, then serves until
/// the listener fails.
pub async fn start_server(config: config::ApiConfig, state: Arc<ApiState>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)?),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async {
                StatusCode::REQUEST_TIMEOUT
            }))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Server listening on http://{} (slots of {} minutes in {})",
        addr,
        config.policy.slot_minutes,
        config.policy.timezone.name()
    );
    axum::serve(listener, app).await?;

    Ok(())
}
