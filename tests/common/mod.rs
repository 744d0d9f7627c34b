//! Fake readers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use system_monitor::{CollectError, Reader};

/// Returns fixed text after an optional delay.
pub struct FakeReader {
    pub output: Result<String, String>,
    pub delay: Duration,
}

impl FakeReader {
    pub fn ok(text: &str) -> Self {
        Self {
            output: Ok(text.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            output: Err(stderr.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(text: &str, delay: Duration) -> Self {
        Self {
            output: Ok(text.to_string()),
            delay,
        }
    }
}

#[async_trait]
impl Reader for FakeReader {
    async fn read(&self) -> Result<String, CollectError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.output {
            Ok(text) => Ok(text.clone()),
            Err(stderr) => Err(CollectError::CommandFailed {
                command: "fake".into(),
                status: "exit status: 1".into(),
                stderr: stderr.clone(),
            }),
        }
    }

    fn describe(&self) -> String {
        "fake".into()
    }
}

/// Panics on every read.
pub struct PanickingReader;

#[async_trait]
impl Reader for PanickingReader {
    async fn read(&self) -> Result<String, CollectError> {
        panic!("probe exploded");
    }

    fn describe(&self) -> String {
        "panicking".into()
    }
}

/// Tracks how many reads are in flight at once.
pub struct InFlightReader {
    pub delay: Duration,
    pub current: Arc<AtomicUsize>,
    pub max: Arc<AtomicUsize>,
    pub total: Arc<AtomicUsize>,
}

impl InFlightReader {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: Arc::new(AtomicUsize::new(0)),
            max: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Reader for InFlightReader {
    async fn read(&self) -> Result<String, CollectError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok("1".into())
    }

    fn describe(&self) -> String {
        "in-flight".into()
    }
}
