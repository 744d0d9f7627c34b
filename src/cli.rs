//! CLI arguments and subcommands for system-monitor.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands, and merges them over the
//! configuration file.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

use system_monitor::config::{load_config, Config, ConfigError, ConfigFormat};

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "system-monitor",
    about = "Host metrics agent sampling CPU, disk and memory counters",
    long_about = "Host metrics agent sampling CPU, disk and memory counters.\n\n\
                  Collects a consistent snapshot of operating-system counters on a fixed \
                  cadence and keeps a short rolling history per consumer. Runs on Linux \
                  (shell probes and /proc) and Windows (PowerShell WMI/CIM queries).",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides the config file)
    #[arg(long, value_enum, env = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Sampling interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,

    /// Collection timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and probe availability
    Check {
        /// Run every configured probe once
        #[arg(long)]
        probes: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Test metrics collection
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Show per-disk details
        #[arg(long)]
        verbose: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Print build and version information
    Version,
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = args.log_level {
        config.log_level = level.as_str().to_string();
    }
    if let Some(bind_ip) = args.bind {
        config.server.bind = bind_ip.to_string();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(interval) = args.interval {
        config.sampler.interval_seconds = interval;
    }
    if let Some(timeout) = args.timeout {
        config.sampler.timeout_seconds = timeout;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let args = Args::parse_from([
            "system-monitor",
            "--no-config",
            "--port",
            "9000",
            "--bind",
            "127.0.0.1",
            "--interval",
            "5",
            "--timeout",
            "3",
            "--log-level",
            "debug",
        ]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.sampler.interval_seconds, 5);
        assert_eq!(cfg.sampler.timeout_seconds, 3);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_no_flags_keeps_config_values() {
        let args = Args::parse_from(["system-monitor", "--no-config"]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_subcommands_parse() {
        let args = Args::parse_from(["system-monitor", "test", "-n", "3", "--format", "json"]);
        assert!(matches!(
            args.command,
            Some(Commands::Test {
                iterations: 3,
                format: ConfigFormat::Json,
                ..
            })
        ));

        let args = Args::parse_from(["system-monitor", "check", "--probes"]);
        assert!(matches!(args.command, Some(Commands::Check { probes: true })));
    }
}
