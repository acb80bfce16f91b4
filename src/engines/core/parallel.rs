//! Parallel processing primitives
//!
//! A fixed-size worker pool that pulls work items from a bounded queue and
//! hands results back over a completion channel, so callers consume results
//! in the order workers finish them rather than the order they were
//! submitted.

use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};

// Queue slots per worker on both the job and the completion channel
const QUEUE_SLOTS_PER_WORKER: usize = 2;

/// Get the default number of threads to use
pub fn default_num_threads() -> usize {
    num_cpus::get()
}

/// Description of a panic caught inside a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPanic {
    pub message: String,
}

impl WorkerPanic {
    fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "worker panicked".to_string()
        };
        Self { message }
    }
}

/// A fixed-size pool of worker threads
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool with `workers` threads
    pub fn new(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("annotate-worker-{}", idx))
            .build()?;

        log::debug!("Initialized worker pool with {} threads", workers);

        Ok(Self { pool, workers })
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` over every item of `items`, calling `on_result` on the
    /// calling thread for each result as soon as a worker completes it.
    ///
    /// Items are pulled lazily from the iterator by a feeder thread, so at
    /// most a few items per worker are in flight at any time. A panic inside
    /// `work` is caught and delivered as `Err(WorkerPanic)` together with the
    /// item it happened on; the remaining items keep running.
    ///
    /// If `on_result` returns an error the run winds down: workers stop
    /// after their current item and the error is returned once every thread
    /// has finished. An error yielded by the input iterator also stops
    /// feeding and is returned after the in-flight items complete.
    pub fn run_unordered<I, T, R, E, W, C>(&self, items: I, work: W, mut on_result: C) -> Result<usize, E>
    where
        I: Iterator<Item = Result<T, E>> + Send,
        T: Send,
        R: Send,
        E: Send,
        W: Fn(&T) -> R + Sync,
        C: FnMut(T, Result<R, WorkerPanic>) -> Result<(), E>,
    {
        let capacity = self.workers * QUEUE_SLOTS_PER_WORKER;
        let (job_tx, job_rx) = bounded::<T>(capacity);
        let (done_tx, done_rx) = bounded::<(T, Result<R, WorkerPanic>)>(capacity);
        let work = &work;

        thread::scope(|s| {
            let feeder = s.spawn(move || feed(items, job_tx));

            s.spawn(move || {
                self.pool.scope(|ps| {
                    for _ in 0..self.workers {
                        let job_rx = job_rx.clone();
                        let done_tx = done_tx.clone();
                        ps.spawn(move |_| drain_jobs(job_rx, done_tx, work));
                    }
                });
            });

            let mut completed = 0;
            let mut sink_result = Ok(());
            for (item, result) in done_rx.iter() {
                if let Err(e) = on_result(item, result) {
                    sink_result = Err(e);
                    break;
                }
                completed += 1;
            }
            // Dropping the receiver makes any blocked worker give up
            drop(done_rx);

            let feed_result = feeder
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            sink_result?;
            feed_result?;
            Ok(completed)
        })
    }
}

fn feed<I, T, E>(items: I, job_tx: Sender<T>) -> Result<(), E>
where
    I: Iterator<Item = Result<T, E>>,
{
    for item in items {
        if job_tx.send(item?).is_err() {
            // All workers are gone; the consumer has stopped
            break;
        }
    }
    Ok(())
}

fn drain_jobs<T, R, W>(job_rx: Receiver<T>, done_tx: Sender<(T, Result<R, WorkerPanic>)>, work: &W)
where
    W: Fn(&T) -> R,
{
    for item in job_rx.iter() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| work(&item)))
            .map_err(WorkerPanic::from_payload);
        if done_tx.send((item, result)).is_err() {
            break;
        }
    }
}
