/// Mapping of domain errors to HTTP responses
pub mod error_handling;
/// Caller identity extraction
pub mod identity;
