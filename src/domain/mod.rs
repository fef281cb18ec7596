// Domain-specific error types
pub mod errors;

// Feature encoding and schema
pub mod ml;

// Pricing rules
pub mod pricing;

// Sales history and inference requests
pub mod sales;
