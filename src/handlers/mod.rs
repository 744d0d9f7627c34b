//! HTTP endpoint handlers for the agent.
//!
//! The HTTP surface carries no snapshot data. It provides:
//! - `/`: Service banner
//! - `/health`: Pipeline liveness
//! - `/metrics`: Prometheus telemetry about the pipeline itself

pub mod health;
pub mod logging;
pub mod metrics;
pub mod root;

// Re-export handlers
pub use health::health_handler;
pub use logging::log_requests;
pub use metrics::metrics_handler;
pub use root::root_handler;
