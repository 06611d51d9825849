// Brokerage accounts domain
pub mod account;

// Index market data domain
pub mod market;

// Port interfaces
pub mod ports;

// Stats derivation
pub mod stats;

// Domain-specific error types
pub mod errors;
