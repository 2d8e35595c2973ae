//! Fixed-capacity pool of leasable worker threads.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Pool                              │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐    ┌─────────┐    ┌─────────┐                 │
//! │  │ Worker0 │    │ Worker1 │    │ Worker2 │  ...  (parked)  │
//! │  └────┬────┘    └────┬────┘    └────┬────┘                 │
//! │       │ offer        │ offer        │ offer                │
//! │       └──────────────┴──────────────┘                      │
//! │                      │                                     │
//! │           ┌──────────▼──────────┐                          │
//! │           │ rendezvous channel  │  (capacity 0)            │
//! │           └──────────┬──────────┘                          │
//! │                      │                                     │
//! │      ┌───────────────▼───────────────┐                     │
//! │      │ acquire() / acquire_group(n)  │  → Worker / Group   │
//! │      └───────────────────────────────┘                     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! A leased worker runs whatever its holder hands it through
//! [`Worker::exec`] until [`Worker::release`], then parks again. Since the
//! acquisition channel is a rendezvous and not a queue, a worker can only be
//! offered while parked, and time spent in `acquire` is the time until some
//! worker actually became free.

mod error;
mod group;
mod stats;
mod worker;

pub use error::{PoolError, PoolResult};
pub use group::Group;
pub use stats::Stats;
pub use worker::Worker;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use stats::Counters;
use worker::WorkerLoop;

/// Default name for pools and their worker threads.
pub const DEFAULT_POOL_NAME: &str = "gpool";

/// A fixed set of worker threads that callers lease, use and hand back.
///
/// Never more than `capacity` leases exist at once; `acquire` blocks while
/// all workers are leased. `Pool` is `Sync`, so it can be shared by reference
/// (for example with [`std::thread::scope`]) between acquiring threads.
pub struct Pool {
    name: Arc<str>,
    offer_rx: Receiver<Worker>,
    stop_tx: Option<Sender<()>>,
    threads: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl Pool {
    /// Create a pool of `capacity` parked workers.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidCapacity`] for a capacity of zero, or
    /// [`PoolError::Spawn`] if a worker thread cannot be started.
    pub fn new(capacity: usize) -> PoolResult<Self> {
        Self::with_name(capacity, DEFAULT_POOL_NAME)
    }

    /// Create a pool whose worker threads are named `{name}-{id}`.
    pub fn with_name(capacity: usize, name: impl Into<String>) -> PoolResult<Self> {
        if capacity == 0 {
            return Err(PoolError::InvalidCapacity);
        }

        let name: Arc<str> = Arc::from(name.into());
        let (offer_tx, offer_rx) = bounded(0);
        let (stop_tx, stop_rx) = bounded(0);
        let counters = Arc::new(Counters::new(capacity));

        // On a spawn failure the already running workers see both channels
        // disconnect when this function returns, and exit.
        let threads = (0..capacity)
            .map(|id| {
                WorkerLoop::spawn(
                    id,
                    Arc::clone(&name),
                    offer_tx.clone(),
                    stop_rx.clone(),
                    Arc::clone(&counters),
                )
            })
            .collect::<PoolResult<Vec<_>>>()?;

        tracing::info!(pool = %name, workers = capacity, "worker pool created");

        Ok(Self {
            name,
            offer_rx,
            stop_tx: Some(stop_tx),
            threads,
            counters,
        })
    }

    /// Pool name used for thread names and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of workers, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.counters.capacity()
    }

    /// Lease a worker, blocking until one parks.
    ///
    /// There is no deadline: while every worker is leased this waits for the
    /// next release. The time spent here is added to
    /// [`Stats::wait_duration`].
    ///
    /// # Errors
    ///
    /// [`PoolError::Closed`] once no worker thread is left to offer itself,
    /// which only happens after every worker died on a panicking task.
    pub fn acquire(&self) -> PoolResult<Worker> {
        let started = Instant::now();
        let worker = self.offer_rx.recv().map_err(|_| PoolError::Closed)?;
        self.on_acquire(&worker, started.elapsed());
        Ok(worker)
    }

    /// Like [`acquire`](Pool::acquire), giving up after `timeout`.
    ///
    /// A timed-out attempt leaves the counters untouched.
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<Worker> {
        let started = Instant::now();
        let worker = self
            .offer_rx
            .recv_timeout(timeout)
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => PoolError::Timeout(timeout),
                RecvTimeoutError::Disconnected => PoolError::Closed,
            })?;
        self.on_acquire(&worker, started.elapsed());
        Ok(worker)
    }

    /// Lease `size` workers one after another and bundle them in a [`Group`].
    ///
    /// Blocks until all `size` workers were acquired. Outstanding leases held
    /// elsewhere that are never released make this wait forever.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidGroupSize`] if `size` is zero or exceeds the
    /// capacity, since such a group could never be completed. If an
    /// acquisition fails midway the workers gathered so far are released.
    pub fn acquire_group(&self, size: usize) -> PoolResult<Group> {
        if size == 0 || size > self.capacity() {
            return Err(PoolError::InvalidGroupSize {
                size,
                capacity: self.capacity(),
            });
        }

        let mut workers = Vec::with_capacity(size);
        for _ in 0..size {
            match self.acquire() {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    workers.into_iter().for_each(Worker::release);
                    return Err(e);
                }
            }
        }

        tracing::trace!(pool = %self.name, size, "group acquired");
        Ok(Group::new(workers))
    }

    /// Snapshot of the utilization counters.
    pub fn stats(&self) -> Stats {
        self.counters.snapshot()
    }

    /// Stop all workers and wait for their threads to exit.
    ///
    /// Parked workers exit right away; leased ones exit once released. A
    /// lease that is never released makes this block forever.
    pub fn close(mut self) {
        tracing::info!(pool = %self.name, "closing worker pool");
        self.stop();

        for handle in self.threads.drain(..) {
            let thread = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                tracing::warn!(pool = %self.name, thread = ?thread, "worker thread had panicked");
            }
        }

        tracing::info!(pool = %self.name, "worker pool closed");
    }

    fn on_acquire(&self, worker: &Worker, wait: Duration) {
        self.counters.on_acquire(wait);
        tracing::trace!(
            pool = %self.name,
            worker = worker.id(),
            wait = ?wait,
            "worker acquired"
        );
    }

    /// Broadcast the stop signal by disconnecting it.
    fn stop(&mut self) {
        self.stop_tx.take();
    }
}

impl Drop for Pool {
    /// Signals stop without joining; use [`Pool::close`] to wait for workers.
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(Pool::new(0).unwrap_err(), PoolError::InvalidCapacity);
    }

    #[test]
    fn test_new_pool_is_all_idle() {
        let pool = Pool::new(4).unwrap();
        let stats = pool.stats();
        assert_eq!(pool.capacity(), 4);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.idle, 4);
        assert_eq!(stats.acquisitions, 0);
        pool.close();
    }

    #[test]
    fn test_single_acquire_stats() {
        let pool = Pool::new(10).unwrap();
        let worker = pool.acquire().unwrap();

        let stats = pool.stats();
        assert_eq!(stats.active, 1);
        assert_eq!(stats.idle, 9);
        assert_eq!(stats.acquisitions, 1);

        worker.release();
        pool.close();
    }

    #[test]
    fn test_exec_on_acquired_worker() {
        let pool = Pool::new(2).unwrap();
        let worker = pool.acquire().unwrap();

        let (tx, rx) = bounded(1);
        worker.exec(move || tx.send(42).unwrap()).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);

        worker.release();
        pool.close();
    }

    #[test]
    fn test_acquire_timeout_when_exhausted() {
        let pool = Pool::new(1).unwrap();
        let worker = pool.acquire().unwrap();

        let err = pool.acquire_timeout(Duration::from_millis(50)).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(pool.stats().acquisitions, 1);

        worker.release();
        let worker = pool
            .acquire_timeout(Duration::from_secs(5))
            .expect("released worker should be acquirable");
        assert_eq!(pool.stats().acquisitions, 2);

        worker.release();
        pool.close();
    }

    #[test]
    fn test_group_size_validation() {
        let pool = Pool::new(3).unwrap();
        assert_eq!(
            pool.acquire_group(0).unwrap_err(),
            PoolError::InvalidGroupSize {
                size: 0,
                capacity: 3
            }
        );
        assert!(matches!(
            pool.acquire_group(4),
            Err(PoolError::InvalidGroupSize { size: 4, .. })
        ));
        assert_eq!(pool.stats().active, 0);
        pool.close();
    }

    #[test]
    fn test_custom_name() {
        let pool = Pool::with_name(1, "lookup").unwrap();
        assert_eq!(pool.name(), "lookup");

        let worker = pool.acquire().unwrap();
        let (tx, rx) = bounded(1);
        worker
            .exec(move || {
                let name = std::thread::current().name().map(str::to_owned);
                tx.send(name).unwrap();
            })
            .unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("lookup-0"));

        worker.release();
        pool.close();
    }

    #[test]
    fn test_drop_without_close_stops_workers() {
        let pool = Pool::new(2).unwrap();
        drop(pool);
    }
}
