//! Snapshot data model.
//!
//! A [`Snapshot`] is one fully populated, timestamped set of metric values.
//! Metrics are identified by the closed [`MetricId`] enumeration which also
//! serves as the index into the collector's slot table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identifier of a tracked metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    CpuUsage,
    CpuUser,
    CpuSystem,
    CpuIdle,
    DiskTps,
    DiskKbPerSec,
    DiskUsage,
    MemoryUsedMb,
}

impl MetricId {
    /// Every metric in slot-table order.
    pub const ALL: [MetricId; 8] = [
        MetricId::CpuUsage,
        MetricId::CpuUser,
        MetricId::CpuSystem,
        MetricId::CpuIdle,
        MetricId::DiskTps,
        MetricId::DiskKbPerSec,
        MetricId::DiskUsage,
        MetricId::MemoryUsedMb,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Stable position in the slot table.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricId::CpuUsage => "cpu_usage",
            MetricId::CpuUser => "cpu_user",
            MetricId::CpuSystem => "cpu_system",
            MetricId::CpuIdle => "cpu_idle",
            MetricId::DiskTps => "disk_tps",
            MetricId::DiskKbPerSec => "disk_kb_per_sec",
            MetricId::DiskUsage => "disk_usage",
            MetricId::MemoryUsedMb => "memory_used_mb",
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Space and inode usage of one device or mount.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiskUsage {
    pub name: String,
    pub total_mb: f64,
    pub used_mb: f64,
    pub used_percent: f64,
    pub inodes_total: f64,
    pub inodes_used: f64,
    /// `-1.0` when no inode data was available for this name.
    pub inodes_used_percent: f64,
}

/// Sentinel for [`DiskUsage::inodes_used_percent`] when inodes are unknown.
pub const INODES_UNKNOWN: f64 = -1.0;

/// Parsed value of a single slot.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    DiskUsage(Vec<DiskUsage>),
}

/// Immutable set of metric values captured in one collection cycle.
///
/// Fields are `None` when the corresponding slot was not configured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,

    pub cpu_usage_percent: Option<f64>,
    pub cpu_user_percent: Option<f64>,
    pub cpu_system_percent: Option<f64>,
    pub cpu_idle_percent: Option<f64>,

    pub disk_tps: Option<f64>,
    pub disk_kb_per_sec: Option<f64>,
    pub disk_usage: Option<Vec<DiskUsage>>,

    pub memory_used_mb: Option<f64>,
}

impl Snapshot {
    /// Creates a snapshot with no metric populated.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu_usage_percent: None,
            cpu_user_percent: None,
            cpu_system_percent: None,
            cpu_idle_percent: None,
            disk_tps: None,
            disk_kb_per_sec: None,
            disk_usage: None,
            memory_used_mb: None,
        }
    }

    /// Stores a slot value in the field belonging to `metric`.
    ///
    /// A value of the wrong shape for the metric is ignored; the slot table
    /// is wired so that this cannot happen.
    pub(crate) fn set(&mut self, metric: MetricId, value: MetricValue) {
        match (metric, value) {
            (MetricId::DiskUsage, MetricValue::DiskUsage(disks)) => self.disk_usage = Some(disks),
            (MetricId::DiskUsage, MetricValue::Scalar(_)) => {}
            (_, MetricValue::DiskUsage(_)) => {}
            (metric, MetricValue::Scalar(v)) => {
                if let Some(field) = self.scalar_field_mut(metric) {
                    *field = Some(v);
                }
            }
        }
    }

    /// Returns the scalar value of `metric`, if populated.
    pub fn scalar(&self, metric: MetricId) -> Option<f64> {
        match metric {
            MetricId::CpuUsage => self.cpu_usage_percent,
            MetricId::CpuUser => self.cpu_user_percent,
            MetricId::CpuSystem => self.cpu_system_percent,
            MetricId::CpuIdle => self.cpu_idle_percent,
            MetricId::DiskTps => self.disk_tps,
            MetricId::DiskKbPerSec => self.disk_kb_per_sec,
            MetricId::MemoryUsedMb => self.memory_used_mb,
            MetricId::DiskUsage => None,
        }
    }

    fn scalar_field_mut(&mut self, metric: MetricId) -> Option<&mut Option<f64>> {
        match metric {
            MetricId::CpuUsage => Some(&mut self.cpu_usage_percent),
            MetricId::CpuUser => Some(&mut self.cpu_user_percent),
            MetricId::CpuSystem => Some(&mut self.cpu_system_percent),
            MetricId::CpuIdle => Some(&mut self.cpu_idle_percent),
            MetricId::DiskTps => Some(&mut self.disk_tps),
            MetricId::DiskKbPerSec => Some(&mut self.disk_kb_per_sec),
            MetricId::MemoryUsedMb => Some(&mut self.memory_used_mb),
            MetricId::DiskUsage => None,
        }
    }
}
