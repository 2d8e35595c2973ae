//! Leasable worker threads.
//!
//! Each worker is one OS thread that alternates between two loops:
//!
//! - **park**: offer a fresh [`Worker`] handle on the pool's rendezvous
//!   channel, racing the pool-wide stop signal.
//! - **run**: execute tasks handed over by the lease holder until the release
//!   signal arrives, then run the release hook and go back to parking.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};

use super::error::{PoolError, PoolResult};
use super::stats::Counters;

/// A unit of work handed to a worker.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// A leased worker.
///
/// Holding a `Worker` means holding its lease exclusively. Tasks submitted
/// through [`exec`](Worker::exec) run one after another on the worker's own
/// thread, in submission order. [`release`](Worker::release) consumes the
/// handle, so a lease cannot be released twice or used afterwards.
#[must_use = "a worker that is never released stays leased and blocks Pool::close"]
pub struct Worker {
    id: usize,
    task_tx: Sender<Task>,
    release_tx: Sender<()>,
}

impl Worker {
    /// Index of this worker inside its pool.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Hand `task` to the worker.
    ///
    /// Blocks until the worker's run loop takes the task, which happens once
    /// any previously submitted task has finished. Does not wait for `task`
    /// itself to finish.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::WorkerGone`] if an earlier task panicked and took
    /// the worker thread down with it.
    pub fn exec<F>(&self, task: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.task_tx
            .send(Box::new(task))
            .map_err(|_| PoolError::WorkerGone { worker: self.id })
    }

    /// End the lease and let the worker park again.
    ///
    /// Never blocks. Tasks already handed over still run to completion before
    /// the worker returns to the pool.
    pub fn release(self) {
        match self.release_tx.try_send(()) {
            Ok(()) => tracing::trace!(worker = self.id, "lease released"),
            // One slot per lease and the handle is consumed here.
            Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                tracing::warn!(worker = self.id, "released a worker whose thread is gone");
            }
        }
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker").field("id", &self.id).finish()
    }
}

/// Thread-side half of a worker.
pub(crate) struct WorkerLoop {
    id: usize,
    pool: Arc<str>,
    task_tx: Sender<Task>,
    task_rx: Receiver<Task>,
    release_tx: Sender<()>,
    release_rx: Receiver<()>,
    offer_tx: Sender<Worker>,
    stop_rx: Receiver<()>,
    counters: Arc<Counters>,
}

impl WorkerLoop {
    /// Spawn worker `id` on its own named thread, parked from the start.
    pub(crate) fn spawn(
        id: usize,
        pool: Arc<str>,
        offer_tx: Sender<Worker>,
        stop_rx: Receiver<()>,
        counters: Arc<Counters>,
    ) -> PoolResult<JoinHandle<()>> {
        let (task_tx, task_rx) = bounded(0);
        let (release_tx, release_rx) = bounded(1);
        let thread_name = format!("{}-{}", pool, id);

        let worker = Self {
            id,
            pool,
            task_tx,
            task_rx,
            release_tx,
            release_rx,
            offer_tx,
            stop_rx,
            counters,
        };

        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.park())?;

        Ok(handle)
    }

    fn lease(&self) -> Worker {
        Worker {
            id: self.id,
            task_tx: self.task_tx.clone(),
            release_tx: self.release_tx.clone(),
        }
    }

    fn park(self) {
        tracing::debug!(pool = %self.pool, worker = self.id, "worker started");

        loop {
            // The stop sender is only ever dropped, so this arm fires on
            // disconnection. A failed offer means the pool itself is gone.
            let leased = select! {
                send(self.offer_tx, self.lease()) -> res => res.is_ok(),
                recv(self.stop_rx) -> _ => false,
            };

            if !leased {
                break;
            }

            tracing::trace!(pool = %self.pool, worker = self.id, "worker leased");
            self.run();
        }

        tracing::debug!(pool = %self.pool, worker = self.id, "worker stopped");
    }

    fn run(&self) {
        loop {
            let task = select! {
                recv(self.task_rx) -> task => task.ok(),
                recv(self.release_rx) -> _ => None,
            };

            match task {
                Some(task) => task(),
                None => break,
            }
        }

        self.counters.on_release();
        tracing::trace!(pool = %self.pool, worker = self.id, "worker back to parking");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Harness {
        offer_rx: Receiver<Worker>,
        stop_tx: Sender<()>,
        counters: Arc<Counters>,
        handle: JoinHandle<()>,
    }

    fn spawn_one() -> Harness {
        let (offer_tx, offer_rx) = bounded(0);
        let (stop_tx, stop_rx) = bounded(0);
        let counters = Arc::new(Counters::new(1));
        let handle = WorkerLoop::spawn(0, Arc::from("test"), offer_tx, stop_rx, counters.clone())
            .expect("spawn worker");
        Harness {
            offer_rx,
            stop_tx,
            counters,
            handle,
        }
    }

    #[test]
    fn test_tasks_run_in_submission_order() {
        let h = spawn_one();
        let worker = h.offer_rx.recv().unwrap();
        h.counters.on_acquire(Duration::ZERO);

        let (tx, rx) = bounded(16);
        for i in 0..10 {
            let tx = tx.clone();
            worker.exec(move || tx.send(i).unwrap()).unwrap();
        }

        let seen: Vec<i32> = (0..10).map(|_| rx.recv().unwrap()).collect();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        worker.release();
        drop(h.stop_tx);
        h.handle.join().unwrap();
    }

    #[test]
    fn test_release_runs_hook_and_reparks() {
        let h = spawn_one();
        let worker = h.offer_rx.recv().unwrap();
        h.counters.on_acquire(Duration::ZERO);
        assert_eq!(h.counters.snapshot().active, 1);

        worker.release();

        // The worker only offers itself again after the release hook ran.
        let again = h
            .offer_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker should park again");
        assert_eq!(again.id(), 0);
        assert_eq!(h.counters.snapshot().active, 0);

        h.counters.on_acquire(Duration::ZERO);
        again.release();
        drop(h.stop_tx);
        h.handle.join().unwrap();
    }

    #[test]
    fn test_stop_ends_parked_worker() {
        let h = spawn_one();
        drop(h.stop_tx);
        h.handle.join().unwrap();
        assert!(h.offer_rx.try_recv().is_err());
    }

    #[test]
    fn test_panicking_task_ends_worker_thread() {
        let h = spawn_one();
        let worker = h.offer_rx.recv().unwrap();
        h.counters.on_acquire(Duration::ZERO);

        worker.exec(|| panic!("task failure")).unwrap();
        assert!(h.handle.join().is_err());

        let err = worker.exec(|| {}).unwrap_err();
        assert_eq!(err, PoolError::WorkerGone { worker: 0 });

        // The lease is never handed back.
        worker.release();
        assert_eq!(h.counters.snapshot().active, 1);
    }

    #[test]
    fn test_debug_shows_id_only() {
        let h = spawn_one();
        let worker = h.offer_rx.recv().unwrap();
        assert_eq!(format!("{:?}", worker), "Worker { id: 0 }");
        h.counters.on_acquire(Duration::ZERO);
        worker.release();
        drop(h.stop_tx);
        h.handle.join().unwrap();
    }
}
