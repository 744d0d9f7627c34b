//! Snapshot collector.
//!
//! Owns the slot table (one optional [`MetricSlot`] per [`MetricId`]) and
//! produces one complete snapshot per call. All present slots run
//! concurrently under a shared deadline; the snapshot is returned only if
//! every slot succeeded.

use ahash::AHashMap as HashMap;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::error::{AggregateError, CollectError, MetricFailure};
use crate::slot::MetricSlot;
use crate::snapshot::{MetricId, MetricValue, Snapshot};

/// Thirty years; stands in for "never" when an offset overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + delay`, clamped to a far-future instant instead of overflowing.
pub(crate) fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Fixed table of metric slots plus the per-collection timeout.
pub struct SnapshotCollector {
    slots: [Option<Arc<MetricSlot>>; MetricId::COUNT],
    timeout: Duration,
}

impl SnapshotCollector {
    /// Creates a collector with every slot empty.
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            timeout,
        }
    }

    /// Places `slot` in the table entry of its metric, replacing any
    /// previous slot for that metric.
    pub fn with_slot(mut self, slot: MetricSlot) -> Self {
        let index = slot.metric().index();
        self.slots[index] = Some(Arc::new(slot));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn slot(&self, metric: MetricId) -> Option<&MetricSlot> {
        self.slots[metric.index()].as_deref()
    }

    /// Metrics with a populated slot, in table order.
    pub fn configured_metrics(&self) -> Vec<MetricId> {
        MetricId::ALL
            .into_iter()
            .filter(|m| self.slots[m.index()].is_some())
            .collect()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Collects one snapshot within the configured timeout.
    pub async fn collect(&self, cancel: &CancellationToken) -> Result<Snapshot, AggregateError> {
        self.collect_until(deadline_after(self.timeout), cancel)
            .await
    }

    /// Collects one snapshot, failing every slot still running at `deadline`.
    ///
    /// Cancelling `cancel` aborts in-flight slots with
    /// [`CollectError::Cancelled`]. The snapshot timestamp is taken once,
    /// after every slot has finished.
    ///
    /// A panicking slot is reported as [`CollectError::Panicked`] only in
    /// builds that unwind; with `panic = "abort"` (the release profile) a
    /// slot panic ends the process.
    #[instrument(skip_all, fields(slots = self.slot_count()))]
    pub async fn collect_until(
        &self,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<Snapshot, AggregateError> {
        let started = Instant::now();
        let budget = deadline.saturating_duration_since(started);

        let mut tasks = JoinSet::new();
        let mut task_metrics = HashMap::new();

        for slot in self.slots.iter().flatten() {
            let slot = Arc::clone(slot);
            let cancel = cancel.clone();
            let metric = slot.metric();

            let handle = tasks.spawn(async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(CollectError::Cancelled),
                    result = tokio::time::timeout_at(deadline, slot.collect()) => {
                        result.unwrap_or_else(|_| Err(CollectError::Timeout(budget)))
                    }
                }
            });
            task_metrics.insert(handle.id(), metric);
        }

        let mut values: Vec<(MetricId, MetricValue)> = Vec::with_capacity(task_metrics.len());
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, Ok(value))) => {
                    if let Some(&metric) = task_metrics.get(&id) {
                        values.push((metric, value));
                    }
                }
                Ok((id, Err(error))) => {
                    if let Some(&metric) = task_metrics.get(&id) {
                        debug!("Metric slot {} failed: {}", metric, error);
                        failures.push(MetricFailure { metric, error });
                    }
                }
                Err(join_error) => {
                    if let Some(&metric) = task_metrics.get(&join_error.id()) {
                        failures.push(MetricFailure {
                            metric,
                            error: CollectError::Panicked(join_error.to_string()),
                        });
                    }
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.metric);
            return Err(AggregateError::new(failures));
        }

        let mut snapshot = Snapshot::empty(Utc::now());
        for (metric, value) in values {
            snapshot.set(metric, value);
        }

        debug!("Collected snapshot in {:?}", started.elapsed());
        Ok(snapshot)
    }
}

impl std::fmt::Debug for SnapshotCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCollector")
            .field("metrics", &self.configured_metrics())
            .field("timeout", &self.timeout)
            .finish()
    }
}
