//! Consumer buffers for tracking recent snapshots.
//!
//! Each consumer owns one [`ConsumerBuffer`] that keeps a trailing time
//! window of snapshots. Memory is bounded by `window / sampling period`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::snapshot::Snapshot;

/// Time-windowed sequence of snapshots, oldest first.
#[derive(Debug)]
pub struct ConsumerBuffer {
    id: u64,
    window: Duration,
    entries: Mutex<VecDeque<Arc<Snapshot>>>,
}

impl ConsumerBuffer {
    pub fn new(id: u64, window: Duration) -> Self {
        Self {
            id,
            window,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Appends a snapshot, then drops every entry older than
    /// `snapshot.timestamp - window` from the front.
    pub fn add(&self, snapshot: Arc<Snapshot>) {
        let newest = snapshot.timestamp;
        let window = chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::MAX);

        let mut entries = self.lock();
        entries.push_back(snapshot);

        while let Some(oldest) = entries.front() {
            if newest.signed_duration_since(oldest.timestamp) > window {
                entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Returns a copy of the current contents, oldest to newest.
    pub fn get(&self) -> Vec<Arc<Snapshot>> {
        self.lock().iter().cloned().collect()
    }

    /// Returns the most recent snapshot, if any.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<Snapshot>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read handle returned by [`Sampler::register`](crate::sampler::Sampler::register).
///
/// Clones share the same buffer; unregistering any of them removes it for
/// all.
#[derive(Debug, Clone)]
pub struct ConsumerHandle {
    buffer: Arc<ConsumerBuffer>,
}

impl ConsumerHandle {
    pub(crate) fn new(buffer: Arc<ConsumerBuffer>) -> Self {
        Self { buffer }
    }

    pub fn id(&self) -> u64 {
        self.buffer.id()
    }

    pub fn window(&self) -> Duration {
        self.buffer.window()
    }

    /// Current contents of the buffer, oldest to newest.
    pub fn get(&self) -> Vec<Arc<Snapshot>> {
        self.buffer.get()
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.buffer.latest()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub(crate) fn buffer(&self) -> &Arc<ConsumerBuffer> {
        &self.buffer
    }
}
