//! Parsers for Unix-like probe output: `top`, `iostat`, `df` and
//! `/proc/meminfo`.

use ahash::AHashSet as HashSet;

use super::{
    join_usage_and_inodes, parse_key_value_table, parse_locale_number, parse_percent,
    parse_scalar, parse_tabular, InodeUsage,
};
use crate::error::ParseError;
use crate::snapshot::{DiskUsage, INODES_UNKNOWN};

/// Header prefix of the `iostat -d` device table.
pub const IOSTAT_HEADER: &str = "Device ";

/// Minimum number of fields in an `iostat` device row.
const IOSTAT_MIN_FIELDS: usize = 5;

/// Minimum number of fields in a `df` row.
const DF_MIN_FIELDS: usize = 5;

/// Parses the single CPU percentage printed by the `top` probe.
pub fn parse_cpu_percent(raw: &str) -> Result<f64, ParseError> {
    parse_scalar(raw)
}

/// Sums the `tps` column over all devices.
pub fn parse_iostat_tps(raw: &str) -> Result<f64, ParseError> {
    parse_tabular(raw, IOSTAT_HEADER, IOSTAT_MIN_FIELDS, |fields| {
        parse_locale_number(fields[1])
    })
}

/// Sums `kB_read/s + kB_wrtn/s` over all devices.
pub fn parse_iostat_kb_per_sec(raw: &str) -> Result<f64, ParseError> {
    parse_tabular(raw, IOSTAT_HEADER, IOSTAT_MIN_FIELDS, |fields| {
        let read = parse_locale_number(fields[2])?;
        let written = parse_locale_number(fields[3])?;
        Ok(read + written)
    })
}

/// Parses `df -P -m` output into space usage rows.
///
/// Inode fields are left unknown; see [`parse_df_with_inodes`]. When a device
/// name repeats, the first row wins.
pub fn parse_df_usage(raw: &str) -> Result<Vec<DiskUsage>, ParseError> {
    let rows = parse_key_value_table(raw, DF_MIN_FIELDS, "disk usage", |fields| {
        fields[1].parse::<f64>().is_ok()
    })?;

    let mut seen = HashSet::new();
    let mut disks = Vec::with_capacity(rows.len());
    for fields in rows {
        let (Ok(total_mb), Ok(used_mb), Ok(used_percent)) = (
            parse_scalar(fields[1]),
            parse_scalar(fields[2]),
            parse_percent(fields[4]),
        ) else {
            continue;
        };

        if !seen.insert(fields[0]) {
            continue;
        }

        disks.push(DiskUsage {
            name: fields[0].to_string(),
            total_mb,
            used_mb,
            used_percent,
            inodes_total: 0.0,
            inodes_used: 0.0,
            inodes_used_percent: INODES_UNKNOWN,
        });
    }

    if disks.is_empty() {
        return Err(ParseError::NoRows {
            table: "disk usage",
        });
    }
    Ok(disks)
}

/// Parses `df -P -i` output into inode usage rows.
///
/// Filesystems without inode accounting print `-` as percentage and are
/// skipped.
pub fn parse_df_inodes(raw: &str) -> Result<Vec<InodeUsage>, ParseError> {
    let rows = parse_key_value_table(raw, DF_MIN_FIELDS, "inode", |fields| {
        fields[1].parse::<u64>().is_ok()
    })?;

    let inodes: Vec<InodeUsage> = rows
        .into_iter()
        .filter_map(|fields| {
            let total = fields[1].parse::<u64>().ok()?;
            let used = fields[2].parse::<u64>().ok()?;
            let used_percent = parse_percent(fields[4]).ok()?;
            Some(InodeUsage {
                name: fields[0].to_string(),
                total: total as f64,
                used: used as f64,
                used_percent,
            })
        })
        .collect();

    if inodes.is_empty() {
        return Err(ParseError::NoRows { table: "inode" });
    }
    Ok(inodes)
}

/// Parses both `df` tables and joins them on the device name.
pub fn parse_df_with_inodes(usage_raw: &str, inode_raw: &str) -> Result<Vec<DiskUsage>, ParseError> {
    let usage = parse_df_usage(usage_raw)?;
    let inodes = parse_df_inodes(inode_raw)?;
    Ok(join_usage_and_inodes(usage, &inodes))
}

/// Computes used memory in MB from `/proc/meminfo`.
///
/// Uses `MemTotal - MemAvailable`, falling back to
/// `MemFree + Buffers + Cached` on kernels without `MemAvailable`.
pub fn parse_meminfo_used_mb(raw: &str) -> Result<f64, ParseError> {
    let mut total_kb: Option<u64> = None;
    let mut available_kb: Option<u64> = None;
    let mut free_kb: Option<u64> = None;
    let mut buffers_kb: u64 = 0;
    let mut cached_kb: u64 = 0;

    for line in raw.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };

        match key {
            "MemTotal:" => total_kb = Some(kb),
            "MemAvailable:" => available_kb = Some(kb),
            "MemFree:" => free_kb = Some(kb),
            "Buffers:" => buffers_kb = kb,
            "Cached:" => cached_kb = kb,
            _ => {}
        }
    }

    let total_kb = total_kb.ok_or(ParseError::ValueNotFound { what: "MemTotal" })?;
    let available_kb = match available_kb {
        Some(kb) => kb,
        None => {
            free_kb.ok_or(ParseError::ValueNotFound { what: "MemAvailable" })? + buffers_kb + cached_kb
        }
    };

    Ok(total_kb.saturating_sub(available_kb) as f64 / 1024.0)
}
