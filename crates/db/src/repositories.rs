pub mod accounts;
pub mod appointments;
pub mod availability;
pub mod credits;
