//! system-monitor - host metrics agent
//!
//! Samples CPU, disk and memory counters into rolling consumer buffers.
//! This is the main entry point that initializes the pipeline and the HTTP
//! stub and handles subcommands.

mod cli;
mod commands;
mod handlers;
mod state;

use anyhow::Context;
use axum::{middleware, routing::get, Router};
use clap::Parser;
use prometheus::Registry;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, level_filters::LevelFilter, warn};

use cli::{resolve_config, Args, Commands};
use commands::{command_check, command_config, command_test, command_version};
use handlers::{health_handler, log_requests, metrics_handler, root_handler};
use state::AppState;
use system_monitor::config::{render_config, validate_effective_config, Config};
use system_monitor::{platform, ConsumerHandle, PipelineMetrics, Sampler};

/// Initializes tracing logging subsystem with the configured log level.
fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let level = match config.log_level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Logging initialized with level: {}", level);
    Ok(())
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Built-in consumer: periodically logs what its buffer holds.
async fn run_consumer_logger(handle: ConsumerHandle, every: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let snapshots = handle.get();
        match snapshots.last() {
            Some(latest) => debug!(
                "Consumer {}: {} snapshot(s) in {:?} window, latest at {} (cpu {:?}%, mem {:?} MB)",
                handle.id(),
                snapshots.len(),
                handle.window(),
                latest.timestamp.to_rfc3339(),
                latest.cpu_usage_percent,
                latest.memory_used_mb
            ),
            None => debug!("Consumer {}: buffer empty", handle.id()),
        }
    }
    debug!("Consumer {} stopped", handle.id());
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        println!("{}", render_config(&config, args.config_format)?);
        return Ok(());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        match command {
            Commands::Version => {
                command_version();
                return Ok(());
            }
            Commands::Config {
                output,
                format,
                commented,
            } => return command_config(output.clone(), *format, *commented),
            _ => {
                // Other commands need config validation
            }
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config)?;

        let ok = match command {
            Commands::Check { probes } => command_check(*probes, &config).await?,
            Commands::Test {
                iterations,
                verbose,
                format,
            } => command_test(*iterations, *verbose, *format, &config).await?,
            Commands::Version | Commands::Config { .. } => true,
        };
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config)?;

    info!("Starting system-monitor {}", env!("CARGO_PKG_VERSION"));

    let platform = match platform::detect() {
        Ok(p) => p,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let collector = platform.build_collector(&config.metrics, config.collect_timeout());
    info!(
        "Platform '{}' wired {} metric slot(s): {:?}",
        platform.name(),
        collector.slot_count(),
        collector.configured_metrics()
    );

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let telemetry = PipelineMetrics::new(&registry)?;
    debug!("Prometheus registry initialized");

    let root = CancellationToken::new();
    let sampler = Arc::new(
        Sampler::new(
            Arc::new(collector),
            config.sampling_interval(),
            root.child_token(),
        )
        .with_telemetry(telemetry),
    );

    let sampler_task = {
        let sampler = Arc::clone(&sampler);
        tokio::spawn(async move { sampler.run().await })
    };

    let consumer_task = if config.consumer.enabled {
        let handle = sampler.register(config.consumer_window());
        info!(
            "Built-in consumer {} registered with {:?} window",
            handle.id(),
            handle.window()
        );
        Some(tokio::spawn(run_consumer_logger(
            handle,
            config.consumer_report_interval(),
            root.child_token(),
        )))
    } else {
        None
    };

    // Setup graceful shutdown signal handlers
    {
        let root = root.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            root.cancel();
        });
    }

    if config.server.enabled {
        let ip: IpAddr = config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?;
        let addr = SocketAddr::new(ip, config.server.port);

        let state = Arc::new(AppState {
            registry,
            sampler: Arc::clone(&sampler),
            platform: platform.name(),
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
        });

        // Configure HTTP server routes
        let app = Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(middleware::from_fn(log_requests))
            .with_state(state);

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("system-monitor listening on http://{}", addr);

        let shutdown = root.clone();
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
        {
            error!("Server error: {}", e);
            root.cancel();
        }
    } else {
        info!("HTTP server disabled");
        root.cancelled().await;
    }

    sampler.stop();
    match sampler_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Sampler: {}", e),
        Err(e) => error!("Sampler task failed: {}", e),
    }
    if let Some(task) = consumer_task {
        if let Err(e) = task.await {
            error!("Consumer task failed: {}", e);
        }
    }

    info!("system-monitor stopped gracefully");
    Ok(())
}
