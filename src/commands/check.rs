//! Check command implementation.
//!
//! Validates configuration, platform support and, optionally, every
//! configured probe.

use std::time::Instant;
use tokio_util::sync::CancellationToken;

use system_monitor::config::{validate_effective_config, Config};
use system_monitor::platform;
use system_monitor::snapshot::MetricId;

/// Validates configuration and probe availability.
pub async fn command_check(probes: bool, config: &Config) -> anyhow::Result<bool> {
    println!("🔍 System Monitor - System Check");
    println!("================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(()) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n🖥️  Checking platform...");
    let platform = match platform::detect() {
        Ok(p) => {
            println!("   ✅ Platform '{}' ({})", p.name(), std::env::consts::OS);
            p
        }
        Err(e) => {
            println!("   ❌ {}", e);
            println!("\n📋 Summary:");
            println!("   ❌ Some checks failed - please review warnings");
            return Ok(false);
        }
    };

    let collector = platform.build_collector(&config.metrics, config.collect_timeout());
    let configured = collector.configured_metrics();

    println!("\n📊 Configured metrics ({}/{}):", configured.len(), MetricId::COUNT);
    for metric in MetricId::ALL {
        match collector.slot(metric) {
            Some(slot) => println!("   ✅ {:<16} {}", metric, slot.describe()),
            None => println!("   ⏸️  {:<16} disabled", metric),
        }
    }
    if config.metrics.network.enabled {
        println!("   ⚠️  network metrics are not implemented and will be ignored");
    }

    if probes {
        println!("\n🧪 Running probes (timeout {:?})...", collector.timeout());
        let cancel = CancellationToken::new();
        let start = Instant::now();
        match collector.collect(&cancel).await {
            Ok(_) => println!(
                "   ✅ All {} probe(s) succeeded in {:.2}ms",
                configured.len(),
                start.elapsed().as_secs_f64() * 1000.0
            ),
            Err(err) => {
                for failure in err.failures() {
                    println!("   ❌ {}: {}", failure.metric, failure.error);
                }
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
    } else {
        println!("   ❌ Some checks failed - please review warnings");
    }
    Ok(all_ok)
}
