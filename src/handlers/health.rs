//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that reports whether
//! the sampling pipeline is alive.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use system_monitor::SamplerState;

use crate::state::SharedState;

/// Handler for the /health endpoint.
///
/// Healthy means the sampler is running and has delivered at least one
/// snapshot.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let sampler = &state.sampler;
    let sampler_state = sampler.state();
    let successful = sampler.successful_ticks();
    let failed = sampler.failed_ticks();

    let (status, message) = match sampler_state {
        SamplerState::Running if successful > 0 => (StatusCode::OK, "OK"),
        SamplerState::Running => (StatusCode::SERVICE_UNAVAILABLE, "Waiting for first snapshot"),
        SamplerState::Idle => (StatusCode::SERVICE_UNAVAILABLE, "Sampler not started"),
        SamplerState::Stopped => (StatusCode::SERVICE_UNAVAILABLE, "Sampler stopped"),
    };

    let mut body = String::new();
    writeln!(body, "{message}").ok();
    writeln!(body).ok();
    writeln!(body, "{:20} {}", "platform", state.platform).ok();
    writeln!(body, "{:20} {:?}", "sampler", sampler_state).ok();
    writeln!(body, "{:20} {}", "metric slots", sampler.collector().slot_count()).ok();
    writeln!(body, "{:20} {}", "successful ticks", successful).ok();
    writeln!(body, "{:20} {}", "failed ticks", failed).ok();
    writeln!(body, "{:20} {}", "consumers", sampler.consumer_count()).ok();
    writeln!(body, "{:20} {}s", "uptime", state.start_time.elapsed().as_secs()).ok();

    debug!("Health check: {} - {}", status, message);
    (status, [("Content-Type", "text/plain; charset=utf-8")], body)
}
