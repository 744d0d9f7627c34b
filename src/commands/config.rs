//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use system_monitor::config::{render_config, Config, ConfigFormat};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("monitor.yaml"),
    };

    let mut content = render_config(&config, format)?;
    if commented && format == ConfigFormat::Yaml {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# System Monitor Configuration
# ============================
#
# log_level: "info"               # off, error, warn, info, debug, trace (env: LOG_LEVEL)
#
# Server (health and telemetry only)
# ----------------------------------
# server.bind: "0.0.0.0"          # Bind IP (0.0.0.0 = all interfaces)
# server.port: 50051              # HTTP port
# server.enabled: true
#
# Sampler
# -------
# sampler.interval_seconds: 1     # Tick period
# sampler.timeout_seconds: 2      # Deadline for one snapshot
#
# Built-in Consumer
# -----------------
# consumer.enabled: true          # Log the rolling buffer periodically
# consumer.window_seconds: 15     # Trailing window kept
# consumer.report_interval_seconds: 1
#
# Metrics
# -------
# Each family has an 'enabled' switch; a metric is collected only when both
# the family switch and its own flag are true.
# metrics.cpu: usage, user, system, idle
# metrics.disk: transfers_per_second, kilobytes_per_second, usage_with_inodes
# metrics.memory: used_mb
# metrics.network.enabled: false  # Not implemented, ignored
"#;

    format!("{comments}\n{yaml}")
}
