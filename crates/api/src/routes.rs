pub mod accounts;
pub mod admin;
pub mod appointments;
pub mod availability;
pub mod health;
