//! Integration tests for the snapshot collector.
//!
//! These tests drive `SnapshotCollector::collect` with fake readers to check
//! the all-or-nothing contract, the shared deadline and cancellation.

mod common;

use chrono::Utc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use common::{FakeReader, PanickingReader};
use system_monitor::parser::parse_scalar;
use system_monitor::parser::unix::{parse_df_inodes, parse_df_usage, parse_iostat_tps};
use system_monitor::snapshot::INODES_UNKNOWN;
use system_monitor::{CollectError, MetricId, MetricSlot, ParseError, SnapshotCollector};

const DF_USAGE: &str = "Filesystem 1M-blocks Used Available Use% Mounted on
/dev/sdc3 100000 50000 50000 50% /
tmpfs 2000 1 1999 1% /run
";

const DF_INODES: &str = "Filesystem Inodes IUsed IFree IUse% Mounted on
/dev/sdc3 54034432 1400000 100000 3% /
";

const IOSTAT: &str = "Linux 5.15.0 (host) \t01/01/2024 \t_x86_64_\t(4 CPU)

Device             tps    kB_read/s    kB_wrtn/s    kB_dscd/s    kB_read    kB_wrtn    kB_dscd
sda               1,00        10,00        20,00         0,00   10000000    20000000          0
sdb               2,50        30,00        40,00         0,00   30000000    40000000          0
";

fn scalar(metric: MetricId, reader: FakeReader) -> MetricSlot {
    MetricSlot::scalar(metric, reader, parse_scalar)
}

#[tokio::test]
async fn test_all_slots_succeed() {
    let collector = SnapshotCollector::new(Duration::from_secs(2))
        .with_slot(scalar(MetricId::CpuUsage, FakeReader::ok("12.5\n")))
        .with_slot(scalar(MetricId::CpuIdle, FakeReader::ok("87.5")))
        .with_slot(MetricSlot::scalar(
            MetricId::DiskTps,
            FakeReader::ok(IOSTAT),
            parse_iostat_tps,
        ))
        .with_slot(MetricSlot::disk_usage(
            FakeReader::ok(DF_USAGE),
            parse_df_usage,
            Some((Box::new(FakeReader::ok(DF_INODES)), parse_df_inodes)),
        ));

    let started = Utc::now();
    let snapshot = collector.collect(&CancellationToken::new()).await.unwrap();

    assert!(snapshot.timestamp >= started);
    assert_eq!(snapshot.cpu_usage_percent, Some(12.5));
    assert_eq!(snapshot.cpu_idle_percent, Some(87.5));
    assert!((snapshot.disk_tps.unwrap() - 3.5).abs() < 1e-9);

    let disks = snapshot.disk_usage.unwrap();
    assert_eq!(disks.len(), 2);
    assert_eq!(disks[0].inodes_used_percent, 3.0);
    assert_eq!(disks[1].name, "tmpfs");
    assert_eq!(disks[1].inodes_total, 0.0);
    assert_eq!(disks[1].inodes_used_percent, INODES_UNKNOWN);

    // Unconfigured slots stay empty.
    assert_eq!(snapshot.cpu_user_percent, None);
    assert_eq!(snapshot.memory_used_mb, None);
}

#[tokio::test]
async fn test_single_failure_fails_whole_snapshot() {
    let collector = SnapshotCollector::new(Duration::from_secs(2))
        .with_slot(scalar(MetricId::CpuUsage, FakeReader::ok("10")))
        .with_slot(scalar(MetricId::CpuUser, FakeReader::ok("not a number")))
        .with_slot(scalar(MetricId::CpuIdle, FakeReader::ok("90")));

    let err = collector
        .collect(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.metrics(), vec![MetricId::CpuUser]);
    assert!(matches!(
        err.failures()[0].error,
        CollectError::Parse(ParseError::InvalidNumber { .. })
    ));
}

#[tokio::test]
async fn test_every_failure_is_reported() {
    let collector = SnapshotCollector::new(Duration::from_secs(2))
        .with_slot(scalar(MetricId::MemoryUsedMb, FakeReader::failing("no such file")))
        .with_slot(scalar(MetricId::CpuSystem, FakeReader::ok("")))
        .with_slot(scalar(MetricId::CpuIdle, FakeReader::ok("1")));

    let err = collector
        .collect(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.metrics(), vec![MetricId::CpuSystem, MetricId::MemoryUsedMb]);
    assert!(err.to_string().starts_with("failed to collect 2 metric(s)"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_slot_times_out() {
    let collector = SnapshotCollector::new(Duration::from_secs(1))
        .with_slot(scalar(MetricId::CpuUsage, FakeReader::ok("10")))
        .with_slot(scalar(
            MetricId::DiskKbPerSec,
            FakeReader::slow("5", Duration::from_secs(30)),
        ));

    let err = collector
        .collect(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.metrics(), vec![MetricId::DiskKbPerSec]);
    assert!(matches!(err.failures()[0].error, CollectError::Timeout(_)));
    assert!(err.failures()[0].error.is_interrupted());
}

#[tokio::test(start_paused = true)]
async fn test_slots_run_concurrently() {
    // Sequentially these would need 3s, well past the deadline.
    let delay = Duration::from_millis(1000);
    let collector = SnapshotCollector::new(Duration::from_millis(1500))
        .with_slot(scalar(MetricId::CpuUsage, FakeReader::slow("1", delay)))
        .with_slot(scalar(MetricId::CpuUser, FakeReader::slow("2", delay)))
        .with_slot(scalar(MetricId::CpuSystem, FakeReader::slow("3", delay)));

    let start = tokio::time::Instant::now();
    let snapshot = collector.collect(&CancellationToken::new()).await.unwrap();

    assert!(start.elapsed() < Duration::from_millis(1500));
    assert_eq!(snapshot.cpu_system_percent, Some(3.0));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_aborts_in_flight_slots() {
    let collector = SnapshotCollector::new(Duration::from_secs(60)).with_slot(scalar(
        MetricId::CpuIdle,
        FakeReader::slow("1", Duration::from_secs(30)),
    ));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = tokio::time::Instant::now();
    let err = collector.collect(&cancel).await.unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(matches!(err.failures()[0].error, CollectError::Cancelled));
}

#[tokio::test]
async fn test_panicking_slot_is_attributed() {
    let collector = SnapshotCollector::new(Duration::from_secs(1))
        .with_slot(MetricSlot::scalar(MetricId::DiskTps, PanickingReader, parse_scalar))
        .with_slot(scalar(MetricId::CpuIdle, FakeReader::ok("1")));

    let err = collector
        .collect(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.metrics(), vec![MetricId::DiskTps]);
    assert!(matches!(err.failures()[0].error, CollectError::Panicked(_)));
}

#[tokio::test]
async fn test_empty_collector_yields_empty_snapshot() {
    let collector = SnapshotCollector::new(Duration::from_secs(1));
    assert_eq!(collector.slot_count(), 0);

    let snapshot = collector.collect(&CancellationToken::new()).await.unwrap();
    for metric in MetricId::ALL {
        assert_eq!(snapshot.scalar(metric), None);
    }
    assert!(snapshot.disk_usage.is_none());
}

#[tokio::test]
async fn test_inode_failure_fails_disk_usage_slot() {
    let collector = SnapshotCollector::new(Duration::from_secs(1)).with_slot(MetricSlot::disk_usage(
        FakeReader::ok(DF_USAGE),
        parse_df_usage,
        Some((Box::new(FakeReader::failing("df: invalid option")), parse_df_inodes)),
    ));

    let err = collector
        .collect(&CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.metrics(), vec![MetricId::DiskUsage]);
}

#[test]
fn test_later_slot_replaces_earlier() {
    let collector = SnapshotCollector::new(Duration::from_secs(1))
        .with_slot(scalar(MetricId::CpuIdle, FakeReader::ok("1")))
        .with_slot(scalar(MetricId::CpuIdle, FakeReader::ok("2")));

    assert_eq!(collector.slot_count(), 1);
    assert_eq!(collector.configured_metrics(), vec![MetricId::CpuIdle]);
}

#[tokio::test]
async fn test_unbounded_timeout_does_not_overflow() {
    let collector = SnapshotCollector::new(Duration::MAX)
        .with_slot(scalar(MetricId::CpuIdle, FakeReader::ok("55")));

    let snapshot = collector.collect(&CancellationToken::new()).await.unwrap();
    assert_eq!(snapshot.cpu_idle_percent, Some(55.0));
}
