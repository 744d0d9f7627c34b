//! Prometheus telemetry about the collection pipeline itself.
//!
//! These are not host metrics: they describe how the sampler is doing
//! (ticks, failures, collection latency, registered consumers).

use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::error::AggregateError;
use crate::snapshot::MetricId;

/// Pipeline counters and gauges, registered with one [`Registry`].
#[derive(Clone)]
pub struct PipelineMetrics {
    pub ticks_total: Counter,
    pub tick_failures_total: Counter,
    pub metric_failures_total: CounterVec, // labels: metric
    pub collect_duration_seconds: Gauge,
    pub last_success_timestamp_seconds: Gauge,
    pub consumers: Gauge,
    pub configured_slots: Gauge,
}

impl PipelineMetrics {
    /// Creates and registers all pipeline metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let ticks_total = Counter::new(
            "system_monitor_ticks_total",
            "Sampler ticks that produced a snapshot",
        )?;
        let tick_failures_total = Counter::new(
            "system_monitor_tick_failures_total",
            "Sampler ticks dropped because collection failed",
        )?;
        let metric_failures_total = CounterVec::new(
            Opts::new(
                "system_monitor_metric_failures_total",
                "Slot failures per metric",
            ),
            &["metric"],
        )?;
        let collect_duration_seconds = Gauge::new(
            "system_monitor_collect_duration_seconds",
            "Duration of the last collection in seconds",
        )?;
        let last_success_timestamp_seconds = Gauge::new(
            "system_monitor_last_success_timestamp_seconds",
            "Unix timestamp of the last successful snapshot",
        )?;
        let consumers = Gauge::new(
            "system_monitor_consumers",
            "Number of registered consumer buffers",
        )?;
        let configured_slots = Gauge::new(
            "system_monitor_configured_slots",
            "Number of metric slots wired into the collector",
        )?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(tick_failures_total.clone()))?;
        registry.register(Box::new(metric_failures_total.clone()))?;
        registry.register(Box::new(collect_duration_seconds.clone()))?;
        registry.register(Box::new(last_success_timestamp_seconds.clone()))?;
        registry.register(Box::new(consumers.clone()))?;
        registry.register(Box::new(configured_slots.clone()))?;

        // Pre-create one series per metric so dashboards see zeros.
        for metric in MetricId::ALL {
            metric_failures_total.with_label_values(&[metric.as_str()]);
        }

        Ok(Self {
            ticks_total,
            tick_failures_total,
            metric_failures_total,
            collect_duration_seconds,
            last_success_timestamp_seconds,
            consumers,
            configured_slots,
        })
    }

    pub fn record_success(&self, duration_secs: f64, timestamp_secs: f64) {
        self.ticks_total.inc();
        self.collect_duration_seconds.set(duration_secs);
        self.last_success_timestamp_seconds.set(timestamp_secs);
    }

    pub fn record_failure(&self, duration_secs: f64, error: &AggregateError) {
        self.tick_failures_total.inc();
        self.collect_duration_seconds.set(duration_secs);
        for failure in error.failures() {
            self.metric_failures_total
                .with_label_values(&[failure.metric.as_str()])
                .inc();
        }
    }
}

/// Encodes every metric of `registry` in the Prometheus text format.
pub fn encode_text(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
