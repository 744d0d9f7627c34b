//! Application state shared with the HTTP handlers.

use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

use system_monitor::config::Config;
use system_monitor::Sampler;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// State shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub sampler: Arc<Sampler>,
    pub platform: &'static str,
    pub config: Arc<Config>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
