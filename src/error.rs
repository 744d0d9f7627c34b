//! Error types for the collection pipeline.
//!
//! Readers fail with [`CollectError`], parsers with [`ParseError`]. A single
//! collection joins every per-metric failure into an [`AggregateError`].

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::snapshot::MetricId;

/// A parser could not interpret raw command or file output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid number {input:?}")]
    InvalidNumber { input: String },

    #[error("header line starting with {header:?} not found")]
    HeaderNotFound { header: String },

    #[error("no rows parsed from {table} table")]
    NoRows { table: &'static str },

    #[error("{what} not found in output")]
    ValueNotFound { what: &'static str },

    #[error("field {field} not found in output")]
    FieldNotFound { field: String },

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("no valid disk entries found")]
    NoDisks,
}

/// Failure of a single metric slot.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("collection cancelled")]
    Cancelled,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("collection task panicked: {0}")]
    Panicked(String),
}

impl CollectError {
    /// True for failures caused by the shared deadline or shutdown rather
    /// than by the probe itself.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CollectError::Timeout(_) | CollectError::Cancelled)
    }
}

/// One failing metric inside an [`AggregateError`].
#[derive(Debug)]
pub struct MetricFailure {
    pub metric: MetricId,
    pub error: CollectError,
}

/// Every slot failure of one collection attempt. No snapshot is produced
/// when this is returned.
#[derive(Debug)]
pub struct AggregateError {
    failures: Vec<MetricFailure>,
}

impl AggregateError {
    pub(crate) fn new(failures: Vec<MetricFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[MetricFailure] {
        &self.failures
    }

    /// Identifiers of the failing metrics, in table order.
    pub fn metrics(&self) -> Vec<MetricId> {
        self.failures.iter().map(|f| f.metric).collect()
    }

    pub fn contains(&self, metric: MetricId) -> bool {
        self.failures.iter().any(|f| f.metric == metric)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to collect {} metric(s)", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", failure.metric, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Startup failure of the platform factory.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unsupported operating system: {0}")]
    Unsupported(String),
}

/// Misuse of the sampler lifecycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplerError {
    #[error("sampler already started; create a new sampler to restart")]
    AlreadyStarted,
}
