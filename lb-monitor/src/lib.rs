//! lb-monitor library crate.
//!
//! Metrics surface of a load-balancer node: a concurrent metrics store with
//! per-upstream connection counts, and the HTTP endpoints that expose it.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{Error, Result};
