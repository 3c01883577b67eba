//! ITSM REST API Server Library
//!
//! Exposes the change tracker over HTTP. Every mutation goes through the
//! same `CommandExecutor` the CLI uses, so a proposal gets the same verdict
//! and message no matter which adapter submitted it.

pub mod routes;

// Re-export for convenience
pub use routes::create_routes;
