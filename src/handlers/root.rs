//! Root endpoint handler.
//!
//! This module provides the `/` endpoint handler that displays the service
//! banner and the available endpoints.

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");

    // Calculate actual uptime from service start time
    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    let metrics: Vec<&str> = state
        .sampler
        .collector()
        .configured_metrics()
        .into_iter()
        .map(|m| m.as_str())
        .collect();

    (
        [("Content-Type", "text/plain; charset=utf-8")],
        format!(
            "system-monitor {version}\n\n\
             platform:  {}\n\
             interval:  {}s\n\
             metrics:   {}\n\
             uptime:    {hours}h {minutes}m {seconds}s\n\n\
             Endpoints:\n  \
             /health   pipeline liveness\n  \
             /metrics  pipeline telemetry (Prometheus)\n",
            state.platform,
            state.config.sampler.interval_seconds,
            metrics.join(", "),
        ),
    )
}
