//! Sampler and broadcaster.
//!
//! The [`Sampler`] drives periodic collection and appends every successful
//! snapshot to all registered consumer buffers. A failed tick is a dropped
//! sample; the next tick is the retry.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::buffer::{ConsumerBuffer, ConsumerHandle};
use crate::collector::{deadline_after, SnapshotCollector};
use crate::error::SamplerError;
use crate::snapshot::Snapshot;
use crate::telemetry::PipelineMetrics;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of a [`Sampler`]. There is no way back from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
    Stopped,
}

impl SamplerState {
    fn from_u8(value: u8) -> Self {
        match value {
            IDLE => SamplerState::Idle,
            RUNNING => SamplerState::Running,
            _ => SamplerState::Stopped,
        }
    }
}

/// Periodic driver owning the registration set.
pub struct Sampler {
    collector: Arc<SnapshotCollector>,
    period: Duration,
    buffers: RwLock<Vec<Arc<ConsumerBuffer>>>,
    next_id: AtomicU64,
    state: AtomicU8,
    cancel: CancellationToken,
    successful_ticks: AtomicU64,
    failed_ticks: AtomicU64,
    telemetry: Option<PipelineMetrics>,
}

impl Sampler {
    /// Creates an idle sampler. Cancelling `cancel` (or calling
    /// [`stop`](Self::stop)) ends [`run`](Self::run).
    pub fn new(collector: Arc<SnapshotCollector>, period: Duration, cancel: CancellationToken) -> Self {
        Self {
            collector,
            period,
            buffers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            state: AtomicU8::new(IDLE),
            cancel,
            successful_ticks: AtomicU64::new(0),
            failed_ticks: AtomicU64::new(0),
            telemetry: None,
        }
    }

    /// Records tick outcomes and consumer counts in `telemetry`.
    pub fn with_telemetry(mut self, telemetry: PipelineMetrics) -> Self {
        telemetry
            .configured_slots
            .set(self.collector.slot_count() as f64);
        self.telemetry = Some(telemetry);
        self
    }

    pub fn collector(&self) -> &SnapshotCollector {
        &self.collector
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> SamplerState {
        SamplerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn successful_ticks(&self) -> u64 {
        self.successful_ticks.load(Ordering::Relaxed)
    }

    pub fn failed_ticks(&self) -> u64 {
        self.failed_ticks.load(Ordering::Relaxed)
    }

    /// Creates a buffer with the given window and adds it to the
    /// registration set. Safe to call while the sampler is ticking.
    pub fn register(&self, window: Duration) -> ConsumerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let buffer = Arc::new(ConsumerBuffer::new(id, window));

        let count = {
            let mut buffers = self.write_buffers();
            buffers.push(Arc::clone(&buffer));
            buffers.len()
        };
        self.report_consumers(count);

        debug!("Registered consumer {} with window {:?}", id, window);
        ConsumerHandle::new(buffer)
    }

    /// Removes the buffer behind `handle`. Returns false if it was not
    /// registered. Dropping a handle never unregisters it.
    pub fn unregister(&self, handle: &ConsumerHandle) -> bool {
        let (removed, count) = {
            let mut buffers = self.write_buffers();
            let before = buffers.len();
            buffers.retain(|b| !Arc::ptr_eq(b, handle.buffer()));
            (buffers.len() != before, buffers.len())
        };

        if removed {
            self.report_consumers(count);
            debug!("Unregistered consumer {}", handle.id());
        }
        removed
    }

    pub fn consumer_count(&self) -> usize {
        self.read_buffers().len()
    }

    /// Cancels the sampler. Idempotent; a sampler stopped before it ran can
    /// never be started.
    pub fn stop(&self) {
        let _ = self
            .state
            .compare_exchange(IDLE, STOPPED, Ordering::SeqCst, Ordering::SeqCst);
        self.cancel.cancel();
    }

    /// Runs the ticking loop until cancelled.
    ///
    /// The first tick fires one period after start. A collection that takes
    /// longer than one period delays the next tick; ticks are never queued.
    pub async fn run(&self) -> Result<(), SamplerError> {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SamplerError::AlreadyStarted)?;

        info!(
            "Sampler started: {} metric slot(s), period {:?}, timeout {:?}",
            self.collector.slot_count(),
            self.period,
            self.collector.timeout()
        );

        let mut ticker = interval_at(deadline_after(self.period), self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.tick().await;
        }

        self.state.store(STOPPED, Ordering::SeqCst);
        info!(
            "Sampler stopped after {} successful and {} failed tick(s)",
            self.successful_ticks(),
            self.failed_ticks()
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn tick(&self) {
        let started = Instant::now();
        let result = self.collector.collect(&self.cancel).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(snapshot) => {
                let timestamp = snapshot.timestamp.timestamp_millis() as f64 / 1000.0;
                let delivered = self.broadcast(Arc::new(snapshot));
                self.successful_ticks.fetch_add(1, Ordering::Relaxed);
                if let Some(telemetry) = &self.telemetry {
                    telemetry.record_success(elapsed, timestamp);
                }
                debug!("Snapshot delivered to {} consumer(s)", delivered);
            }
            Err(err) => {
                self.failed_ticks.fetch_add(1, Ordering::Relaxed);
                if let Some(telemetry) = &self.telemetry {
                    telemetry.record_failure(elapsed, &err);
                }
                if self.cancel.is_cancelled() {
                    debug!("Collection interrupted by shutdown: {}", err);
                } else {
                    warn!("Dropping sample: {}", err);
                }
            }
        }
    }

    /// Appends `snapshot` to every registered buffer in one read-locked pass.
    fn broadcast(&self, snapshot: Arc<Snapshot>) -> usize {
        let buffers = self.read_buffers();
        for buffer in buffers.iter() {
            buffer.add(Arc::clone(&snapshot));
        }
        buffers.len()
    }

    fn report_consumers(&self, count: usize) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.consumers.set(count as f64);
        }
    }

    fn read_buffers(&self) -> RwLockReadGuard<'_, Vec<Arc<ConsumerBuffer>>> {
        self.buffers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_buffers(&self) -> RwLockWriteGuard<'_, Vec<Arc<ConsumerBuffer>>> {
        self.buffers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("state", &self.state())
            .field("period", &self.period)
            .field("consumers", &self.consumer_count())
            .field("collector", &self.collector)
            .finish()
    }
}
