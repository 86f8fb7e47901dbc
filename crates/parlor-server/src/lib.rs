//! # Parlor Server
//!
//! HTTP front end of the Parlor chat backend.
//!
//! The server exposes registration, heartbeats, and message reads and
//! writes as JSON endpoints, runs the expiration sweeper in the background,
//! and exports Prometheus metrics.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;

pub use config::Config;
pub use handlers::{build_router, run_server, AppState};
