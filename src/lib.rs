//! System Monitor Library
//!
//! This library provides the host metric collection pipeline of the
//! `system-monitor` agent: probe readers, output parsers, a concurrent
//! snapshot collector, platform wiring, and a sampler that broadcasts
//! snapshots to time-windowed consumer buffers.
//!
//! # Features
//!
//! - **All-or-nothing snapshots**: every configured metric is collected concurrently
//!   under one deadline; a snapshot is only produced if all of them succeed
//! - **Platform factory**: Unix-like (`sh`, `/proc`) or Windows (PowerShell, WMI/CIM)
//!   sources selected once at startup
//! - **Windowed consumers**: each consumer keeps its own trailing window of snapshots
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use system_monitor::{platform, MetricsConfig, Sampler};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let platform = platform::detect()?;
//! let collector = platform.build_collector(&MetricsConfig::default(), Duration::from_secs(2));
//!
//! let sampler = Arc::new(Sampler::new(
//!     Arc::new(collector),
//!     Duration::from_secs(1),
//!     CancellationToken::new(),
//! ));
//! let consumer = sampler.register(Duration::from_secs(15));
//!
//! let runner = Arc::clone(&sampler);
//! tokio::spawn(async move { runner.run().await });
//!
//! for snapshot in consumer.get() {
//!     println!("{}: idle {:?}", snapshot.timestamp, snapshot.cpu_idle_percent);
//! }
//! sampler.stop();
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod collector;
pub mod config;
pub mod error;
pub mod parser;
pub mod platform;
pub mod reader;
pub mod sampler;
pub mod slot;
pub mod snapshot;
pub mod telemetry;

// Re-export main types for convenience
pub use buffer::{ConsumerBuffer, ConsumerHandle};
pub use collector::SnapshotCollector;
pub use config::{Config, MetricsConfig};
pub use error::{AggregateError, CollectError, MetricFailure, ParseError, PlatformError, SamplerError};
pub use platform::Platform;
pub use reader::{CommandReader, FileReader, Reader, Shell};
pub use sampler::{Sampler, SamplerState};
pub use slot::MetricSlot;
pub use snapshot::{DiskUsage, MetricId, MetricValue, Snapshot};
pub use telemetry::PipelineMetrics;
