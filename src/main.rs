use std::sync::Arc;

use clinicbook_api::{ApiState, config::ApiConfig};
use clinicbook_core::clock::SystemClock;
use clinicbook_db::{PgScheduleRepository, create_pool, schema::initialize_database};
use clinicbook_session::{HttpSessionProvider, SessionConfig};
use color_eyre::eyre::Result;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;
    let session_config = SessionConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    let state = ApiState::new(
        Arc::new(PgScheduleRepository::new(db_pool)),
        Arc::new(HttpSessionProvider::new(session_config)?),
        Arc::new(SystemClock),
        config.policy.clone(),
    )?;

    // Start API server
    clinicbook_api::start_server(config, Arc::new(state)).await?;

    Ok(())
}
