//! # API Configuration Module
//!
//! This module handles loading and managing configuration for the clinicbook API server.
//! It retrieves configuration values from environment variables and provides defaults
//! where appropriate.
//!
//! ## Environment Variables
//!
//! The following environment variables are used:
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Request timeout (default: 30)
//!
//! Scheduling policy:
//!
//! - `SLOT_MINUTES` (default: 30), `HORIZON_DAYS` (default: 4), `BOOKING_COST` (default: 2)
//! - `JOIN_LEAD_MINUTES` (default: 30), `TOKEN_GRACE_MINUTES` (default: 60)
//! - `SCHEDULE_TIMEZONE`: IANA zone used for windows and labels (default: "UTC")

use chrono_tz::Tz;
use clinicbook_core::policy::SchedulingPolicy;
use eyre::{Result, WrapErr, eyre};
use std::{env, str::FromStr};
use tracing::Level;

/// Configuration for the clinicbook API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use clinicbook_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}:{}", config.host, config.port);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Slot, cost and timing rules for scheduling
    pub policy: SchedulingPolicy,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The DATABASE_URL environment variable is not set
    /// - The API_PORT value cannot be parsed as a u16
    /// - A scheduling policy value cannot be parsed
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Network settings
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| eyre!("DATABASE_URL environment variable must be set"))?;

        // Logging settings
        let log_level = match lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = lookup("API_CORS_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Performance settings
        let request_timeout = lookup("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .unwrap_or(30);

        let policy = policy_from_lookup(&lookup)?;

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            policy,
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| eyre!("Invalid {} value: {}", key, raw)),
        None => Ok(default),
    }
}

/// Reads the scheduling policy, falling back to [`SchedulingPolicy::default`] per key.
pub fn policy_from_lookup<F>(lookup: &F) -> Result<SchedulingPolicy>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = SchedulingPolicy::default();

    let slot_minutes: i64 = parse_or(lookup, "SLOT_MINUTES", defaults.slot_minutes)?;
    if slot_minutes <= 0 {
        return Err(eyre!("SLOT_MINUTES must be positive"));
    }
    let horizon_days = parse_or(lookup, "HORIZON_DAYS", defaults.horizon_days)?;
    let booking_cost: i64 = parse_or(lookup, "BOOKING_COST", defaults.booking_cost)?;
    if booking_cost <= 0 {
        return Err(eyre!("BOOKING_COST must be positive"));
    }
    let join_lead_minutes = parse_or(lookup, "JOIN_LEAD_MINUTES", defaults.join_lead_minutes)?;
    let token_grace_minutes =
        parse_or(lookup, "TOKEN_GRACE_MINUTES", defaults.token_grace_minutes)?;
    let timezone = match lookup("SCHEDULE_TIMEZONE") {
        Some(name) => name
            .trim()
            .parse::<Tz>()
            .map_err(|e| eyre!("Invalid SCHEDULE_TIMEZONE value: {}", e))?,
        None => defaults.timezone,
    };

    Ok(SchedulingPolicy {
        slot_minutes,
        horizon_days,
        booking_cost,
        join_lead_minutes,
        token_grace_minutes,
        timezone,
    })
}
