//! Metric parsers.
//!
//! Pure functions turning raw probe output into typed values. The generic
//! building blocks live here; the platform formats are in [`unix`] and
//! [`windows`]. Both platform modules are compiled everywhere so they can be
//! tested against captured output on any host.

pub mod unix;
pub mod windows;

use ahash::AHashMap as HashMap;

use crate::error::ParseError;
use crate::snapshot::{DiskUsage, INODES_UNKNOWN};

/// Parses a single decimal number surrounded by optional whitespace.
pub fn parse_scalar(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            input: trimmed.to_string(),
        })
}

/// Parses a number that may use either `.` or `,` as decimal separator.
///
/// A single `.` with digits on both sides is a decimal point. Otherwise every
/// `.` is a thousands separator and the first `,` is the decimal point.
pub fn parse_locale_number(token: &str) -> Result<f64, ParseError> {
    let value: String = token.chars().filter(|c| !c.is_whitespace()).collect();

    if value.matches('.').count() == 1 {
        if let Some((int_part, frac_part)) = value.split_once('.') {
            if is_digits(int_part.trim_start_matches(['-', '+'])) && is_digits(frac_part) {
                return parse_scalar(&value);
            }
        }
    }

    let normalized = value.replace('.', "").replacen(',', ".", 1);
    normalized
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber {
            input: token.to_string(),
        })
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Sums a value extracted from every data row following a header line.
///
/// Rows with fewer than `min_fields` fields and rows the extractor rejects are
/// skipped. A missing header is an error; a header with no rows yields `0`.
pub fn parse_tabular<F>(
    raw: &str,
    header_prefix: &str,
    min_fields: usize,
    extractor: F,
) -> Result<f64, ParseError>
where
    F: Fn(&[&str]) -> Result<f64, ParseError>,
{
    let mut found_header = false;
    let mut total = 0.0;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !found_header {
            if line.replace('\t', " ").starts_with(header_prefix) {
                found_header = true;
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < min_fields {
            continue;
        }

        if let Ok(value) = extractor(&fields) {
            total += value;
        }
    }

    if !found_header {
        return Err(ParseError::HeaderNotFound {
            header: header_prefix.trim().to_string(),
        });
    }

    Ok(total)
}

/// Splits output into whitespace-separated rows, dropping short rows and
/// rows rejected by `keep` (typically the header).
pub fn parse_key_value_table<'a, F>(
    raw: &'a str,
    min_fields: usize,
    table: &'static str,
    keep: F,
) -> Result<Vec<Vec<&'a str>>, ParseError>
where
    F: Fn(&[&str]) -> bool,
{
    let rows: Vec<Vec<&str>> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| fields.len() >= min_fields && keep(fields))
        .collect();

    if rows.is_empty() {
        return Err(ParseError::NoRows { table });
    }
    Ok(rows)
}

/// Inode usage of one device, as reported by the inode table.
#[derive(Debug, Clone, PartialEq)]
pub struct InodeUsage {
    pub name: String,
    pub total: f64,
    pub used: f64,
    pub used_percent: f64,
}

/// Left-joins space usage with inode usage on the device name.
///
/// Usage rows without inode data keep zero inode counts and get
/// [`INODES_UNKNOWN`] as percentage. Inode rows without a usage row are
/// dropped.
pub fn join_usage_and_inodes(usage: Vec<DiskUsage>, inodes: &[InodeUsage]) -> Vec<DiskUsage> {
    let by_name: HashMap<&str, &InodeUsage> = inodes
        .iter()
        .rev()
        .map(|inode| (inode.name.as_str(), inode))
        .collect();

    usage
        .into_iter()
        .map(|mut disk| {
            match by_name.get(disk.name.as_str()) {
                Some(inode) => {
                    disk.inodes_total = inode.total;
                    disk.inodes_used = inode.used;
                    disk.inodes_used_percent = inode.used_percent;
                }
                None => {
                    disk.inodes_total = 0.0;
                    disk.inodes_used = 0.0;
                    disk.inodes_used_percent = INODES_UNKNOWN;
                }
            }
            disk
        })
        .collect()
}

/// Parses a percentage token such as `42%`.
pub(crate) fn parse_percent(token: &str) -> Result<f64, ParseError> {
    parse_scalar(token.trim_end_matches('%'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("  12.5\n").unwrap(), 12.5);
        assert_eq!(parse_scalar("0").unwrap(), 0.0);
        assert_eq!(
            parse_scalar(" abc "),
            Err(ParseError::InvalidNumber {
                input: "abc".into()
            })
        );
        assert!(parse_scalar("").is_err());
    }

    #[test]
    fn test_parse_locale_number() {
        assert_eq!(parse_locale_number("9.68").unwrap(), 9.68);
        assert_eq!(parse_locale_number("9,68").unwrap(), 9.68);
        assert_eq!(parse_locale_number("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_locale_number("1.234.567").unwrap(), 1234567.0);
        assert_eq!(parse_locale_number("42").unwrap(), 42.0);
        assert_eq!(parse_locale_number("1 234,5").unwrap(), 1234.5);
        assert!(parse_locale_number("n/a").is_err());
    }

    #[test]
    fn test_parse_tabular_sums_rows() {
        let raw = "Linux 5.15.0 (host)\t01/01/2024\n\n\
                   Device             tps    kB_read/s    kB_wrtn/s    kB_dscd/s\n\
                   sda               1,00        12,34        34,56     123456     345678\n\
                   sdb               2,50        10,00        20,00     100000     200000\n";
        let total = parse_tabular(raw, "Device ", 5, |f| parse_locale_number(f[1])).unwrap();
        assert!((total - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_tabular_skips_bad_rows() {
        let raw = "Device tps kB_read/s kB_wrtn/s kB_dscd/s\n\
                   short 1\n\
                   sda x 1 2 3\n\
                   sdb 4 1 2 3\n";
        let total = parse_tabular(raw, "Device ", 5, |f| parse_locale_number(f[1])).unwrap();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn test_parse_tabular_header_only_is_zero() {
        let raw = "Device tps kB_read/s kB_wrtn/s\n";
        assert_eq!(parse_tabular(raw, "Device ", 5, |_| Ok(1.0)).unwrap(), 0.0);
    }

    #[test]
    fn test_parse_tabular_missing_header() {
        assert_eq!(
            parse_tabular("", "Device ", 5, |_| Ok(1.0)),
            Err(ParseError::HeaderNotFound {
                header: "Device".into()
            })
        );
        assert!(parse_tabular("sda 1 2 3 4 5", "Device ", 5, |_| Ok(1.0)).is_err());
    }

    #[test]
    fn test_parse_key_value_table_filters() {
        let raw = "Filesystem 1M-blocks Used Available Use% Mounted on\n\
                   /dev/sda1 100 50 50 50% /\n\
                   short row\n";
        let rows = parse_key_value_table(raw, 5, "usage", |f| f[1].parse::<f64>().is_ok()).unwrap();
        assert_eq!(rows, vec![vec!["/dev/sda1", "100", "50", "50", "50%", "/"]]);

        assert_eq!(
            parse_key_value_table("Filesystem Inodes IUsed IFree IUse%", 5, "inode", |f| f[1]
                .parse::<u64>()
                .is_ok()),
            Err(ParseError::NoRows { table: "inode" })
        );
    }

    #[test]
    fn test_join_marks_missing_inodes() {
        let usage = vec![
            DiskUsage {
                name: "/dev/sda1".into(),
                total_mb: 100.0,
                used_mb: 50.0,
                used_percent: 50.0,
                ..Default::default()
            },
            DiskUsage {
                name: "tmpfs".into(),
                total_mb: 10.0,
                used_mb: 1.0,
                used_percent: 10.0,
                ..Default::default()
            },
        ];
        let inodes = vec![InodeUsage {
            name: "/dev/sda1".into(),
            total: 1000.0,
            used: 30.0,
            used_percent: 3.0,
        }];

        let joined = join_usage_and_inodes(usage, &inodes);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].inodes_total, 1000.0);
        assert_eq!(joined[0].inodes_used_percent, 3.0);
        assert_eq!(joined[1].name, "tmpfs");
        assert_eq!(joined[1].inodes_total, 0.0);
        assert_eq!(joined[1].inodes_used, 0.0);
        assert_eq!(joined[1].inodes_used_percent, INODES_UNKNOWN);
    }

    #[test]
    fn test_join_prefers_first_inode_row() {
        let usage = vec![DiskUsage {
            name: "tmpfs".into(),
            ..Default::default()
        }];
        let inodes = vec![
            InodeUsage {
                name: "tmpfs".into(),
                total: 10.0,
                used: 1.0,
                used_percent: 10.0,
            },
            InodeUsage {
                name: "tmpfs".into(),
                total: 99.0,
                used: 9.0,
                used_percent: 9.0,
            },
        ];
        let joined = join_usage_and_inodes(usage, &inodes);
        assert_eq!(joined[0].inodes_total, 10.0);
    }
}
