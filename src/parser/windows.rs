//! Parsers for Windows management-query output (WMI/CIM via PowerShell).

use serde_json::Value;

use super::parse_scalar;
use crate::error::ParseError;
use crate::snapshot::DiskUsage;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Assumed allocation unit used to approximate inode counts on NTFS, which
/// has no inode table.
pub const APPROX_BYTES_PER_INODE: f64 = 4096.0;

/// Parses `wmic cpu get loadpercentage` output.
pub fn parse_load_percentage(raw: &str) -> Result<f64, ParseError> {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && *line != "LoadPercentage")
        .ok_or(ParseError::ValueNotFound { what: "cpu load" })
        .and_then(parse_scalar)
}

/// Parses the first non-empty line as a number.
pub fn parse_first_number(raw: &str) -> Result<f64, ParseError> {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or(ParseError::ValueNotFound {
            what: "numeric value",
        })
        .and_then(parse_scalar)
}

/// Converts a bytes-per-second counter to kilobytes per second.
pub fn parse_bytes_as_kb(raw: &str) -> Result<f64, ParseError> {
    Ok(parse_first_number(raw)? / 1024.0)
}

/// Extracts `field` from `Format-List` style output (`Key : Value` lines).
pub fn parse_list_field(raw: &str, field: &str) -> Result<f64, ParseError> {
    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim() == field {
            return parse_scalar(value);
        }
    }

    Err(ParseError::FieldNotFound {
        field: field.to_string(),
    })
}

/// Sums disk reads and writes per second of the `_Total` logical disk.
pub fn parse_disk_transfers_per_sec(raw: &str) -> Result<f64, ParseError> {
    let reads = parse_list_field(raw, "DiskReadsPersec")?;
    let writes = parse_list_field(raw, "DiskWritesPersec")?;
    Ok(reads + writes)
}

/// Computes used physical memory in MB from `Win32_OperatingSystem`.
pub fn parse_memory_used_mb(raw: &str) -> Result<f64, ParseError> {
    let total_kb = parse_list_field(raw, "TotalVisibleMemorySize")?;
    let free_kb = parse_list_field(raw, "FreePhysicalMemory")?;
    Ok((total_kb - free_kb).max(0.0) / 1024.0)
}

/// Parses a JSON array of logical disks with `Name`, `Size` and `FreeSpace`.
///
/// Sizes may be numbers or numeric strings; a size that cannot be read counts
/// as zero. Inode values are approximated from the size at
/// [`APPROX_BYTES_PER_INODE`] bytes per inode, with the same fill level as the
/// space usage.
pub fn parse_disk_usage_json(raw: &str) -> Result<Vec<DiskUsage>, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::InvalidJson("empty disk usage output".into()));
    }

    let value: Value = serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let Value::Array(entries) = value else {
        return Err(ParseError::InvalidJson("expected an array of disks".into()));
    };

    let disks: Vec<DiskUsage> = entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("Name")?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }

            let total = entry.get("Size").and_then(number_from_value).unwrap_or(0.0);
            let free = entry.get("FreeSpace").and_then(number_from_value).unwrap_or(0.0);
            let used = (total - free).max(0.0);

            let used_percent = if total > 0.0 { used / total * 100.0 } else { 0.0 };
            let inodes_total = total / APPROX_BYTES_PER_INODE;

            Some(DiskUsage {
                name: name.to_string(),
                total_mb: total / BYTES_PER_MB,
                used_mb: used / BYTES_PER_MB,
                used_percent,
                inodes_total,
                inodes_used: inodes_total * used_percent / 100.0,
                inodes_used_percent: used_percent,
            })
        })
        .collect();

    if disks.is_empty() {
        return Err(ParseError::NoDisks);
    }
    Ok(disks)
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_percentage() {
        assert_eq!(parse_load_percentage("LoadPercentage\n\n  75").unwrap(), 75.0);
        assert_eq!(parse_load_percentage("  90").unwrap(), 90.0);
        assert!(parse_load_percentage("").is_err());
        assert!(parse_load_percentage("LoadPercentage\nabc").is_err());
    }

    #[test]
    fn test_first_number() {
        assert_eq!(parse_first_number("  75.5").unwrap(), 75.5);
        assert_eq!(parse_first_number("\n\n  42\n").unwrap(), 42.0);
        assert!(parse_first_number("invalid data").is_err());
        assert_eq!(
            parse_first_number(""),
            Err(ParseError::ValueNotFound {
                what: "numeric value"
            })
        );
    }

    #[test]
    fn test_bytes_as_kb() {
        assert_eq!(parse_bytes_as_kb("2048\r\n").unwrap(), 2.0);
    }

    #[test]
    fn test_list_field() {
        assert_eq!(parse_list_field("DiskReadsPersec : 10", "DiskReadsPersec").unwrap(), 10.0);
        assert_eq!(
            parse_list_field("Name : _Total\r\nDiskWritesPersec : 5\r\n", "DiskWritesPersec").unwrap(),
            5.0
        );
        assert!(matches!(
            parse_list_field("DiskReadsPersec : 10", "UnknownField"),
            Err(ParseError::FieldNotFound { .. })
        ));
        assert!(parse_list_field("DiskReadsPersec 10", "DiskReadsPersec").is_err());
        assert!(parse_list_field("", "DiskReadsPersec").is_err());
        assert!(parse_list_field("DiskReadsPersec : invalid", "DiskReadsPersec").is_err());
    }

    #[test]
    fn test_disk_transfers_per_sec() {
        assert_eq!(
            parse_disk_transfers_per_sec("DiskReadsPersec : 10\nDiskWritesPersec : 20").unwrap(),
            30.0
        );
        assert!(parse_disk_transfers_per_sec("DiskWritesPersec : 5").is_err());
        assert!(parse_disk_transfers_per_sec("DiskReadsPersec : 10").is_err());
        assert!(parse_disk_transfers_per_sec("DiskReadsPersec : invalid\nDiskWritesPersec : 5").is_err());
    }

    #[test]
    fn test_memory_used_mb() {
        let raw = "\r\nTotalVisibleMemorySize : 16384000\r\nFreePhysicalMemory     : 8192000\r\n";
        assert_eq!(parse_memory_used_mb(raw).unwrap(), 8000.0);
    }

    #[test]
    fn test_disk_usage_json() {
        let total_c: u64 = 500_000_000_000;
        let free_c: u64 = 100_000_000_000;
        let total_d: u64 = 1_000_000_000_000;
        let free_d: u64 = 500_000_000_000;

        let raw = json!([
            { "Name": "C:", "Size": total_c.to_string(), "FreeSpace": free_c.to_string() },
            { "Name": "D:", "Size": total_d, "FreeSpace": free_d },
            { "Name": "", "Size": 1, "FreeSpace": 1 },
            { "Size": 1, "FreeSpace": 1 }
        ])
        .to_string();

        let disks = parse_disk_usage_json(&raw).unwrap();
        assert_eq!(disks.len(), 2);

        let c = &disks[0];
        assert_eq!(c.name, "C:");
        assert!((c.total_mb - total_c as f64 / BYTES_PER_MB).abs() < 0.1);
        assert!((c.used_mb - (total_c - free_c) as f64 / BYTES_PER_MB).abs() < 0.1);
        assert!((c.used_percent - 80.0).abs() < 0.1);
        assert!((c.inodes_total - total_c as f64 / 4096.0).abs() < 1.0);
        assert!((c.inodes_used - total_c as f64 / 4096.0 * 0.8).abs() < 1.0);
        assert!((c.inodes_used_percent - 80.0).abs() < 0.1);

        let d = &disks[1];
        assert_eq!(d.name, "D:");
        assert!((d.used_percent - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_disk_usage_json_zero_size() {
        let raw = r#"[{"Name": "E:", "Size": null, "FreeSpace": null}]"#;
        let disks = parse_disk_usage_json(raw).unwrap();
        assert_eq!(disks[0].total_mb, 0.0);
        assert_eq!(disks[0].used_percent, 0.0);
        assert_eq!(disks[0].inodes_total, 0.0);
    }

    #[test]
    fn test_disk_usage_json_rejects_bad_input() {
        assert!(parse_disk_usage_json("").is_err());
        assert!(parse_disk_usage_json(r#"{"Name": "C:", "Size": "invalid"}"#).is_err());
        assert!(parse_disk_usage_json("not json").is_err());
        assert_eq!(parse_disk_usage_json("[]"), Err(ParseError::NoDisks));
        assert_eq!(
            parse_disk_usage_json(r#"[{"Name": "  "}]"#),
            Err(ParseError::NoDisks)
        );
    }
}
