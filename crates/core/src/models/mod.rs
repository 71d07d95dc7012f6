pub mod account;
pub mod appointment;
pub mod availability;
pub mod credit;
