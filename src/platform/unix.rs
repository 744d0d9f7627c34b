//! Unix-like metric sources: shell pipelines run through `sh -c` with the C
//! locale, plus `/proc/meminfo`.

use super::Platform;
use crate::parser::unix::{
    parse_cpu_percent, parse_df_inodes, parse_df_usage, parse_iostat_kb_per_sec,
    parse_iostat_tps, parse_meminfo_used_mb,
};
use crate::reader::{CommandReader, FileReader, Shell};
use crate::slot::MetricSlot;
use crate::snapshot::MetricId;

/// Total CPU load: user + system + nice.
pub const CPU_USAGE_COMMAND: &str =
    r#"top -bn1 | grep "Cpu(s)" | awk '{print $2 + $4 + $6}' | sed 's/,/./'"#;
pub const CPU_USER_COMMAND: &str = r#"top -bn1 | grep "Cpu(s)" | awk '{print $2}' | sed 's/,/./'"#;
pub const CPU_SYSTEM_COMMAND: &str =
    r#"top -bn1 | grep "Cpu(s)" | awk '{print $4}' | sed 's/,/./'"#;
pub const CPU_IDLE_COMMAND: &str = r#"top -bn1 | grep "Cpu(s)" | awk '{print $8}' | sed 's/,/./'"#;

/// One-second device report; `-y` skips the since-boot summary.
pub const IOSTAT_COMMAND: &str = "iostat -d -k -y 1 1";

pub const DF_USAGE_COMMAND: &str = "df -P -m";
pub const DF_INODES_COMMAND: &str = "df -P -i";

pub const MEMINFO_PATH: &str = "/proc/meminfo";

/// Metric sources for Linux and other Unix-like hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPlatform;

fn sh(command: &str) -> CommandReader {
    CommandReader::new(Shell::Sh, command)
}

impl Platform for UnixPlatform {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn slot(&self, metric: MetricId) -> Option<MetricSlot> {
        let slot = match metric {
            MetricId::CpuUsage => MetricSlot::scalar(metric, sh(CPU_USAGE_COMMAND), parse_cpu_percent),
            MetricId::CpuUser => MetricSlot::scalar(metric, sh(CPU_USER_COMMAND), parse_cpu_percent),
            MetricId::CpuSystem => MetricSlot::scalar(metric, sh(CPU_SYSTEM_COMMAND), parse_cpu_percent),
            MetricId::CpuIdle => MetricSlot::scalar(metric, sh(CPU_IDLE_COMMAND), parse_cpu_percent),
            MetricId::DiskTps => MetricSlot::scalar(metric, sh(IOSTAT_COMMAND), parse_iostat_tps),
            MetricId::DiskKbPerSec => {
                MetricSlot::scalar(metric, sh(IOSTAT_COMMAND), parse_iostat_kb_per_sec)
            }
            MetricId::DiskUsage => MetricSlot::disk_usage(
                sh(DF_USAGE_COMMAND),
                parse_df_usage,
                Some((Box::new(sh(DF_INODES_COMMAND)), parse_df_inodes)),
            ),
            MetricId::MemoryUsedMb => {
                MetricSlot::scalar(metric, FileReader::new(MEMINFO_PATH), parse_meminfo_used_mb)
            }
        };
        Some(slot)
    }
}
