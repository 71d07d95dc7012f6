//! HTTP adapter for the real-time session service used by appointments.

pub mod client;
pub mod config;

pub use client::HttpSessionProvider;
pub use config::SessionConfig;
