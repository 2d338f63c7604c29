//! Core business logic - framework-agnostic validation, aggregation and display formatting.

/// Derived dashboard values and chart series
pub mod aggregation;
/// Currency, date and due-day display helpers
pub mod format;
/// Form input validation for new records
pub mod validation;
