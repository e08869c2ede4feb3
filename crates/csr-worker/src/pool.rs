use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use tracing::debug;

use crate::status::PoolStatus;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// `min_workers`/`max_workers` bounds for a [`Pool`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub min_workers: usize,
    pub max_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { min_workers: 2, max_workers: 10 }
    }
}

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    cv: Condvar,
    worker_count: AtomicUsize,
    running: AtomicUsize,
    shutdown: AtomicBool,
    config: PoolConfig,
}

/// A bounded elastic thread pool. Submissions queue on an
/// unbounded FIFO; workers above `min_workers` exit once they observe an
/// empty queue, and a new worker is spun up when a submission finds the
/// queue already backed up and the pool below `max_workers`.
///
/// Cancellation is not the pool's concern: a running job owns its own
/// cooperative stop flag (see `csr_model::ScanContext`) and checks it at
/// target boundaries. The pool only ever runs a job to completion.
pub struct Pool {
    shared: Arc<Shared>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            cv: Condvar::new(),
            worker_count: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            config,
        });

        let handles = (0..config.min_workers).map(|_| spawn_worker(Arc::clone(&shared))).collect();

        Self { shared, handles: Mutex::new(handles) }
    }

    /// Submits a job to run on the pool. Spawns an additional worker
    /// first if the queue is already backed up and the pool has room to
    /// grow.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let should_spawn = {
            let mut queue = self.shared.queue.lock().expect("worker queue mutex poisoned");
            let was_nonempty = !queue.is_empty();
            queue.push_back(Box::new(job));
            was_nonempty && self.shared.worker_count.load(Ordering::SeqCst) < self.shared.config.max_workers
        };

        if should_spawn {
            let handle = spawn_worker(Arc::clone(&self.shared));
            self.handles.lock().expect("worker handles mutex poisoned").push(handle);
        }

        self.shared.cv.notify_one();
    }

    pub fn status(&self) -> PoolStatus {
        let queued = self.shared.queue.lock().expect("worker queue mutex poisoned").len();
        PoolStatus {
            worker_count: self.shared.worker_count.load(Ordering::SeqCst),
            running: self.shared.running.load(Ordering::SeqCst),
            queued,
            min_workers: self.shared.config.min_workers,
            max_workers: self.shared.config.max_workers,
        }
    }

    /// Signals shutdown and blocks until every worker thread exits. Jobs
    /// already queued are dropped without running.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.cv.notify_all();
        let mut handles = self.handles.lock().expect("worker handles mutex poisoned");
        for handle in handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(shared: Arc<Shared>) -> JoinHandle<()> {
    shared.worker_count.fetch_add(1, Ordering::SeqCst);
    std::thread::spawn(move || worker_loop(shared))
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().expect("worker queue mutex poisoned");
            loop {
                if let Some(job) = queue.pop_front() {
                    break Some(job);
                }
                if shared.shutdown.load(Ordering::SeqCst) {
                    break None;
                }
                if shared.worker_count.load(Ordering::SeqCst) > shared.config.min_workers {
                    debug!("worker above min_workers found an empty queue, shrinking");
                    shared.worker_count.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
                queue = shared.cv.wait(queue).expect("worker queue mutex poisoned");
            }
        };

        match job {
            Some(job) => {
                shared.running.fetch_add(1, Ordering::SeqCst);
                job();
                shared.running.fetch_sub(1, Ordering::SeqCst);
            }
            None => {
                shared.worker_count.fetch_sub(1, Ordering::SeqCst);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn runs_a_submitted_job() {
        let pool = Pool::new(PoolConfig { min_workers: 1, max_workers: 2 });
        let counter = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&counter);
        pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_reports_min_workers_at_rest() {
        let pool = Pool::new(PoolConfig { min_workers: 3, max_workers: 5 });
        std::thread::sleep(Duration::from_millis(20));
        let status = pool.status();
        assert_eq!(status.worker_count, 3);
        assert!(status.is_idle());
    }

    #[test]
    fn grows_beyond_min_when_backlogged() {
        let pool = Pool::new(PoolConfig { min_workers: 1, max_workers: 4 });
        let gate = Arc::new((Mutex::new(false), Condvar::new()));

        for _ in 0..3 {
            let gate = Arc::clone(&gate);
            pool.submit(move || {
                let (lock, cv) = &*gate;
                let mut released = lock.lock().unwrap();
                while !*released {
                    released = cv.wait(released).unwrap();
                }
            });
        }

        std::thread::sleep(Duration::from_millis(50));
        assert!(pool.status().worker_count > 1);

        let (lock, cv) = &*gate;
        *lock.lock().unwrap() = true;
        cv.notify_all();
    }

    #[test]
    fn shutdown_joins_all_workers() {
        let pool = Pool::new(PoolConfig { min_workers: 2, max_workers: 4 });
        pool.shutdown();
        assert_eq!(pool.status().worker_count, 0);
    }
}
