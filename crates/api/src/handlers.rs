/// Onboarding and credit history for the caller
pub mod accounts;
/// Provider verification and credit allocation
pub mod admin;
/// Booking, cancellation and the appointment lifecycle
pub mod appointments;
/// Provider lookup, availability windows and open slots
pub mod availability;
