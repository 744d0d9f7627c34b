//! Configuration management for system-monitor.
//!
//! This module handles loading and validating configuration from files. It
//! supports YAML, JSON, and TOML formats; every field has a default so a
//! partial file (or no file at all) yields a complete configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::snapshot::MetricId;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 50051;
pub const DEFAULT_INTERVAL_SECONDS: u64 = 1;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 2;
pub const DEFAULT_WINDOW_SECONDS: u64 = 15;

/// Upper bounds accepted by [`validate_effective_config`].
pub const MAX_INTERVAL_SECONDS: u64 = 86_400;
pub const MAX_TIMEOUT_SECONDS: u64 = 3_600;
pub const MAX_WINDOW_SECONDS: u64 = 30 * 86_400;

/// Locations searched when no config path is given, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "/etc/system-monitor/monitor.yaml",
    "./configs/monitor.yaml",
    "./monitor.yaml",
];

pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Failure to load, render or validate a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML configuration: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("failed to render TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Output format for rendering a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}
fn default_bind() -> String {
    DEFAULT_BIND_ADDR.into()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_interval_seconds() -> u64 {
    DEFAULT_INTERVAL_SECONDS
}
fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}
fn default_window_seconds() -> u64 {
    DEFAULT_WINDOW_SECONDS
}
fn default_report_interval_seconds() -> u64 {
    1
}

/// HTTP stub server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            enabled: true,
        }
    }
}

/// Sampling cadence and the per-collection deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Tick period in seconds (default: 1)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Deadline shared by all slots of one collection (default: 2)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// The built-in consumer that logs its buffer periodically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Trailing window kept by the consumer buffer (default: 15)
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    #[serde(default = "default_report_interval_seconds")]
    pub report_interval_seconds: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_seconds: default_window_seconds(),
            report_interval_seconds: default_report_interval_seconds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub usage: bool,
    #[serde(default = "default_true")]
    pub user: bool,
    #[serde(default = "default_true")]
    pub system: bool,
    #[serde(default = "default_true")]
    pub idle: bool,
}

impl Default for CpuMetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            usage: true,
            user: true,
            system: true,
            idle: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub transfers_per_second: bool,
    #[serde(default = "default_true")]
    pub kilobytes_per_second: bool,
    #[serde(default = "default_true")]
    pub usage_with_inodes: bool,
}

impl Default for DiskMetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transfers_per_second: true,
            kilobytes_per_second: true,
            usage_with_inodes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub used_mb: bool,
}

impl Default for MemoryMetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            used_mb: true,
        }
    }
}

/// Accepted for compatibility; network collection is not implemented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Which metric families and individual metrics are collected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub cpu: CpuMetricsConfig,
    #[serde(default)]
    pub disk: DiskMetricsConfig,
    #[serde(default)]
    pub memory: MemoryMetricsConfig,
    #[serde(default)]
    pub network: NetworkMetricsConfig,
}

impl MetricsConfig {
    /// True when the family switch and the metric's own flag are both on.
    pub fn is_enabled(&self, metric: MetricId) -> bool {
        let cpu = &self.cpu;
        let disk = &self.disk;
        let memory = &self.memory;
        match metric {
            MetricId::CpuUsage => cpu.enabled && cpu.usage,
            MetricId::CpuUser => cpu.enabled && cpu.user,
            MetricId::CpuSystem => cpu.enabled && cpu.system,
            MetricId::CpuIdle => cpu.enabled && cpu.idle,
            MetricId::DiskTps => disk.enabled && disk.transfers_per_second,
            MetricId::DiskKbPerSec => disk.enabled && disk.kilobytes_per_second,
            MetricId::DiskUsage => disk.enabled && disk.usage_with_inodes,
            MetricId::MemoryUsedMb => memory.enabled && memory.used_mb,
        }
    }

    /// Enabled metrics in table order.
    pub fn enabled_metrics(&self) -> Vec<MetricId> {
        MetricId::ALL
            .into_iter()
            .filter(|m| self.is_enabled(*m))
            .collect()
    }

    /// Everything off except the listed metrics.
    pub fn only(metrics: &[MetricId]) -> Self {
        let on = |m: MetricId| metrics.contains(&m);
        Self {
            cpu: CpuMetricsConfig {
                enabled: true,
                usage: on(MetricId::CpuUsage),
                user: on(MetricId::CpuUser),
                system: on(MetricId::CpuSystem),
                idle: on(MetricId::CpuIdle),
            },
            disk: DiskMetricsConfig {
                enabled: true,
                transfers_per_second: on(MetricId::DiskTps),
                kilobytes_per_second: on(MetricId::DiskKbPerSec),
                usage_with_inodes: on(MetricId::DiskUsage),
            },
            memory: MemoryMetricsConfig {
                enabled: true,
                used_mb: on(MetricId::MemoryUsedMb),
            },
            network: NetworkMetricsConfig::default(),
        }
    }
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub consumer: ConsumerConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            sampler: SamplerConfig::default(),
            consumer: ConsumerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs(self.sampler.interval_seconds)
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_secs(self.sampler.timeout_seconds)
    }

    pub fn consumer_window(&self) -> Duration {
        Duration::from_secs(self.consumer.window_seconds)
    }

    pub fn consumer_report_interval(&self) -> Duration {
        Duration::from_secs(self.consumer.report_interval_seconds)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.sampler.interval_seconds == 0 {
        return Err(ConfigError::Invalid(
            "sampler.interval_seconds must be greater than 0".into(),
        ));
    }
    if cfg.sampler.interval_seconds > MAX_INTERVAL_SECONDS {
        return Err(ConfigError::Invalid(format!(
            "sampler.interval_seconds must be at most {}",
            MAX_INTERVAL_SECONDS
        )));
    }
    if cfg.sampler.timeout_seconds == 0 {
        return Err(ConfigError::Invalid(
            "sampler.timeout_seconds must be greater than 0".into(),
        ));
    }
    if cfg.sampler.timeout_seconds > MAX_TIMEOUT_SECONDS {
        return Err(ConfigError::Invalid(format!(
            "sampler.timeout_seconds must be at most {}",
            MAX_TIMEOUT_SECONDS
        )));
    }

    if cfg.consumer.enabled {
        if cfg.consumer.window_seconds == 0 {
            return Err(ConfigError::Invalid(
                "consumer.window_seconds must be greater than 0 when the consumer is enabled"
                    .into(),
            ));
        }
        if cfg.consumer.window_seconds > MAX_WINDOW_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "consumer.window_seconds must be at most {}",
                MAX_WINDOW_SECONDS
            )));
        }
        if cfg.consumer.report_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "consumer.report_interval_seconds must be greater than 0".into(),
            ));
        }
    }

    let level = cfg.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "Invalid log_level '{}', expected one of: {}",
            cfg.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if cfg.metrics.enabled_metrics().is_empty() {
        return Err(ConfigError::Invalid(
            "At least one metric must be enabled under metrics.cpu/disk/memory".into(),
        ));
    }

    Ok(())
}

/// Returns the first existing default config location.
pub fn find_default_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Loads configuration from `path`, or from the first existing default
/// location. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match find_default_config() {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        info!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, ConfigError> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}
