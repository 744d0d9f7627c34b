//! Windows metric sources: WMI and CIM queries run through PowerShell.
//!
//! NTFS has no inode table, so the disk usage slot has no inode reader and
//! inode values are approximated by the JSON parser.

use super::Platform;
use crate::parser::windows::{
    parse_bytes_as_kb, parse_disk_transfers_per_sec, parse_disk_usage_json, parse_first_number,
    parse_load_percentage, parse_memory_used_mb,
};
use crate::reader::{CommandReader, Shell};
use crate::slot::MetricSlot;
use crate::snapshot::MetricId;

pub const CPU_LOAD_COMMAND: &str = "wmic cpu get loadpercentage";

pub const CPU_USER_COMMAND: &str = r#"(Get-WmiObject -Namespace "root\CIMV2" -Query "SELECT * FROM Win32_PerfFormattedData_Counters_ProcessorInformation WHERE Name='_Total'").PercentUserTime"#;
pub const CPU_SYSTEM_COMMAND: &str = r#"(Get-WmiObject -Namespace "root\CIMV2" -Query "SELECT * FROM Win32_PerfFormattedData_Counters_ProcessorInformation WHERE Name='_Total'").PercentPrivilegedTime"#;
pub const CPU_IDLE_COMMAND: &str = r#"(Get-WmiObject -Namespace "root\CIMV2" -Query "SELECT * FROM Win32_PerfFormattedData_Counters_ProcessorInformation WHERE Name='_Total'").PercentIdleTime"#;

pub const DISK_IO_COMMAND: &str = r#"Get-WmiObject -Namespace "root\CIMV2" -Query "SELECT * FROM Win32_PerfFormattedData_PerfDisk_LogicalDisk WHERE Name='_Total'" | Format-List DiskReadsPersec,DiskWritesPersec"#;
pub const DISK_BYTES_COMMAND: &str = r#"(Get-WmiObject -Namespace "root\CIMV2" -Query "SELECT * FROM Win32_PerfFormattedData_PerfDisk_LogicalDisk WHERE Name='_Total'").DiskBytesPerSec"#;

/// Local fixed disks as a JSON array, even when there is only one.
pub const DISK_USAGE_COMMAND: &str = r#"ConvertTo-Json -Compress -InputObject @(Get-CimInstance Win32_LogicalDisk -Filter "DriveType=3" | Select-Object Name,Size,FreeSpace)"#;

pub const MEMORY_COMMAND: &str =
    "Get-CimInstance Win32_OperatingSystem | Format-List TotalVisibleMemorySize,FreePhysicalMemory";

/// Metric sources for Windows hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

fn powershell(command: &str) -> CommandReader {
    CommandReader::new(Shell::PowerShell, command)
}

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn slot(&self, metric: MetricId) -> Option<MetricSlot> {
        let slot = match metric {
            MetricId::CpuUsage => {
                MetricSlot::scalar(metric, powershell(CPU_LOAD_COMMAND), parse_load_percentage)
            }
            MetricId::CpuUser => {
                MetricSlot::scalar(metric, powershell(CPU_USER_COMMAND), parse_first_number)
            }
            MetricId::CpuSystem => {
                MetricSlot::scalar(metric, powershell(CPU_SYSTEM_COMMAND), parse_first_number)
            }
            MetricId::CpuIdle => {
                MetricSlot::scalar(metric, powershell(CPU_IDLE_COMMAND), parse_first_number)
            }
            MetricId::DiskTps => MetricSlot::scalar(
                metric,
                powershell(DISK_IO_COMMAND),
                parse_disk_transfers_per_sec,
            ),
            MetricId::DiskKbPerSec => {
                MetricSlot::scalar(metric, powershell(DISK_BYTES_COMMAND), parse_bytes_as_kb)
            }
            MetricId::DiskUsage => {
                MetricSlot::disk_usage(powershell(DISK_USAGE_COMMAND), parse_disk_usage_json, None)
            }
            MetricId::MemoryUsedMb => {
                MetricSlot::scalar(metric, powershell(MEMORY_COMMAND), parse_memory_used_mb)
            }
        };
        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_usage_has_no_inode_reader() {
        let slot = WindowsPlatform.slot(MetricId::DiskUsage).unwrap();
        assert!(!slot.describe().contains(" + "));
        assert!(slot.describe().contains("Win32_LogicalDisk"));
    }
}
