//! Fan-out over a batch of leased workers.

use std::sync::Arc;

use crossbeam_utils::sync::WaitGroup;

use super::error::PoolResult;
use super::worker::Worker;

/// A fixed-size batch of leased workers with a completion barrier.
///
/// Built by [`Pool::acquire_group`](super::Pool::acquire_group). The batch
/// cannot grow or shrink; it ends when its workers are handed back through
/// [`wait_and_release`](Group::wait_and_release) or
/// [`release`](Group::release).
#[must_use = "a group that is never released keeps its workers leased"]
#[derive(Debug)]
pub struct Group {
    workers: Vec<Worker>,
    barrier: WaitGroup,
}

impl Group {
    pub(crate) fn new(workers: Vec<Worker>) -> Self {
        Self {
            workers,
            barrier: WaitGroup::new(),
        }
    }

    /// Number of workers in the group.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// The leased workers, in acquisition order.
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Run `f` once on every worker of the group.
    ///
    /// Returns as soon as every worker has accepted its copy, without waiting
    /// for `f` to finish. Each copy counts towards the barrier that
    /// [`wait_and_release`](Group::wait_and_release) waits on, so `exec` may
    /// be called several times before waiting.
    ///
    /// # Errors
    ///
    /// Stops at the first worker whose thread is gone and returns
    /// [`PoolError::WorkerGone`](super::PoolError::WorkerGone). Copies already
    /// handed out keep running.
    pub fn exec<F>(&self, f: F) -> PoolResult<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let f = Arc::new(f);

        for worker in &self.workers {
            let f = Arc::clone(&f);
            // Dropped after `f` returns, or while unwinding if it panics.
            let done = self.barrier.clone();
            worker.exec(move || {
                f();
                drop(done);
            })?;
        }

        Ok(())
    }

    /// Block until every `f` handed out by [`exec`](Group::exec) has
    /// finished, then release all workers.
    pub fn wait_and_release(self) {
        let Group { workers, barrier } = self;
        barrier.wait();
        release_all(workers);
    }

    /// Release all workers right away, without waiting for outstanding work.
    pub fn release(self) {
        release_all(self.workers);
    }
}

fn release_all(workers: Vec<Worker>) {
    for worker in workers {
        worker.release();
    }
}

#[cfg(test)]
mod tests {
    use super::super::Pool;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_exec_runs_on_every_worker() {
        let pool = Pool::new(4).unwrap();
        let group = pool.acquire_group(4).unwrap();
        assert_eq!(group.len(), 4);

        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        group
            .exec(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        group.wait_and_release();

        assert_eq!(counter.load(Ordering::SeqCst), 4);
        pool.close();
    }

    #[test]
    fn test_each_worker_runs_on_its_own_thread() {
        let pool = Pool::new(3).unwrap();
        let group = pool.acquire_group(3).unwrap();

        let names = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let n = names.clone();
        group
            .exec(move || {
                let name = thread::current().name().map(str::to_owned);
                n.lock().push(name);
            })
            .unwrap();
        group.wait_and_release();

        let mut names = names.lock().clone();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|n| n.as_deref().is_some_and(|n| n.starts_with("gpool-"))));
        pool.close();
    }

    #[test]
    fn test_multiple_exec_before_wait() {
        let pool = Pool::new(2).unwrap();
        let group = pool.acquire_group(2).unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let c = counter.clone();
            group
                .exec(move || {
                    thread::sleep(Duration::from_millis(10));
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        group.wait_and_release();

        assert_eq!(counter.load(Ordering::SeqCst), 6);
        pool.close();
    }

    #[test]
    fn test_release_without_exec() {
        let pool = Pool::new(2).unwrap();
        let group = pool.acquire_group(2).unwrap();
        assert!(!group.is_empty());
        let ids: Vec<usize> = group.workers().iter().map(|w| w.id()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        group.release();
        pool.close();
    }
}
