//! HTTP API server module.
//!
//! Exposes the read-only monitoring endpoints.

pub mod error;
pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
