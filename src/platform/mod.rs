//! Platform factory.
//!
//! A [`Platform`] knows which probes and parsers produce each metric on one
//! operating-system family. The platform is chosen once at startup with
//! [`detect`] or [`for_os`]; there is no generic fallback.

pub mod unix;
pub mod windows;

use std::time::Duration;
use tracing::{debug, warn};

use crate::collector::SnapshotCollector;
use crate::config::MetricsConfig;
use crate::error::PlatformError;
use crate::slot::MetricSlot;
use crate::snapshot::MetricId;

pub use unix::UnixPlatform;
pub use windows::WindowsPlatform;

/// Builds a snapshot collector wired to one platform's metric sources.
pub trait Platform: Send + Sync {
    /// Short platform label used in logs.
    fn name(&self) -> &'static str;

    /// Creates the slot for `metric`, or `None` if this platform has no
    /// source for it.
    fn slot(&self, metric: MetricId) -> Option<MetricSlot>;

    /// Creates a collector with one slot per metric enabled in `metrics`.
    fn build_collector(&self, metrics: &MetricsConfig, timeout: Duration) -> SnapshotCollector {
        if metrics.network.enabled {
            warn!("Network metrics are not implemented; metrics.network.enabled is ignored");
        }

        let mut collector = SnapshotCollector::new(timeout);
        for metric in metrics.enabled_metrics() {
            match self.slot(metric) {
                Some(slot) => {
                    debug!("{}: {} <- {}", self.name(), metric, slot.describe());
                    collector = collector.with_slot(slot);
                }
                None => debug!("{}: no source for {}", self.name(), metric),
            }
        }
        collector
    }
}

/// Selects the platform for an operating system name as reported by
/// `std::env::consts::OS`.
pub fn for_os(os: &str) -> Result<Box<dyn Platform>, PlatformError> {
    match os {
        "linux" => Ok(Box::new(UnixPlatform)),
        "windows" => Ok(Box::new(WindowsPlatform)),
        other => Err(PlatformError::Unsupported(other.to_string())),
    }
}

/// Selects the platform of the running host.
pub fn detect() -> Result<Box<dyn Platform>, PlatformError> {
    for_os(std::env::consts::OS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_os_selects_variant() {
        assert_eq!(for_os("linux").unwrap().name(), "unix");
        assert_eq!(for_os("windows").unwrap().name(), "windows");
    }

    #[test]
    fn test_for_os_rejects_unknown() {
        for os in ["macos", "freebsd", ""] {
            assert!(matches!(
                for_os(os),
                Err(PlatformError::Unsupported(name)) if name == os
            ));
        }
    }

    #[test]
    fn test_disabled_metrics_leave_slots_empty() {
        let metrics = MetricsConfig::only(&[MetricId::CpuIdle, MetricId::MemoryUsedMb]);
        let collector = UnixPlatform.build_collector(&metrics, Duration::from_secs(2));

        assert_eq!(
            collector.configured_metrics(),
            vec![MetricId::CpuIdle, MetricId::MemoryUsedMb]
        );
        assert!(collector.slot(MetricId::DiskUsage).is_none());
        assert_eq!(collector.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_family_switch_disables_all_members() {
        let mut metrics = MetricsConfig::default();
        metrics.disk.enabled = false;

        let collector = WindowsPlatform.build_collector(&metrics, Duration::from_secs(1));
        assert_eq!(collector.slot_count(), 5);
        for metric in [MetricId::DiskTps, MetricId::DiskKbPerSec, MetricId::DiskUsage] {
            assert!(collector.slot(metric).is_none());
        }
    }

    #[test]
    fn test_both_platforms_cover_every_metric() {
        let metrics = MetricsConfig::default();
        for platform in [for_os("linux").unwrap(), for_os("windows").unwrap()] {
            let collector = platform.build_collector(&metrics, Duration::from_secs(1));
            assert_eq!(collector.configured_metrics(), MetricId::ALL.to_vec());
        }
    }
}
