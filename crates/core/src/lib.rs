//! # ClinicBook Core
//!
//! Scheduling and booking engine for two-party consultations. A provider publishes a
//! daily availability window; requesters book fixed-size slots from it, paying a fixed
//! number of credits that move to the provider and move back on cancellation.
//!
//! ## Layout
//!
//! - **Models**: accounts, availability windows, appointments, ledger entries
//! - **Ports**: [`repository`] (transactional store), [`session`] (external session host),
//!   [`clock`]
//! - **Services**: slot generation, booking, cancellation, appointment lifecycle,
//!   availability and account administration
//! - **Adapters for tests**: [`memory::MemoryStore`] and [`mock`] implementations
//!
//! Storage backends live in other crates and only need to implement
//! [`repository::ScheduleRepository`] and [`repository::UnitOfWork`].

pub mod clock;
pub mod errors;
pub mod memory;
pub mod mock;
pub mod models;
pub mod policy;
pub mod repository;
pub mod services;
pub mod session;
