//! Pool utilization counters.

use std::time::Duration;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};

/// Point-in-time snapshot of pool utilization.
///
/// Taken under a read lock, so `active + idle == capacity` holds for every
/// snapshot. It may be stale by the time the caller looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    /// Number of workers the pool was built with.
    pub capacity: usize,
    /// Workers currently leased.
    pub active: usize,
    /// Workers parked or on their way back to parking.
    pub idle: usize,
    /// Successful acquisitions since the pool was created.
    pub acquisitions: u64,
    /// Total time callers spent blocked in acquire.
    #[serde(rename = "wait_ms", serialize_with = "serialize_millis")]
    pub wait_duration: Duration,
}

impl Stats {
    /// Mean time a successful acquisition spent waiting for a worker.
    pub fn avg_wait(&self) -> Duration {
        match u32::try_from(self.acquisitions) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.wait_duration / n,
            Err(_) => Duration::from_secs_f64(
                self.wait_duration.as_secs_f64() / self.acquisitions as f64,
            ),
        }
    }
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_nanos() as f64 / 1_000_000.0)
}

/// Lock-protected counter block shared by the pool and its workers.
#[derive(Debug)]
pub(crate) struct Counters {
    capacity: usize,
    inner: RwLock<Stats>,
}

impl Counters {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Stats {
                capacity,
                idle: capacity,
                ..Stats::default()
            }),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a completed hand-off that took `wait` to happen.
    pub(crate) fn on_acquire(&self, wait: Duration) {
        let mut stats = self.inner.write();
        stats.active += 1;
        stats.idle -= 1;
        stats.acquisitions += 1;
        stats.wait_duration += wait;
    }

    /// Release hook, run by a worker when its lease ends.
    pub(crate) fn on_release(&self) {
        let mut stats = self.inner.write();
        stats.active -= 1;
        stats.idle += 1;
    }

    pub(crate) fn snapshot(&self) -> Stats {
        *self.inner.read()
    }
}
