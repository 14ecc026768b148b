//! The process-wide timer that drives rotation and compression.
//!
//! One [`Scheduler`] is meant to exist per process, constructed by the
//! top-level wiring and handed to every appender at build time. Rotation
//! fires at most once per day per appender and compression is deferred
//! work, so a single timer thread feeding a small fixed pool of worker
//! threads is enough; the pool never grows.
//!
//! # Examples
//!
//! ```rust
//! # fn docs() {
//! use std::time::Duration;
//! use tracing_rolling::scheduler::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! scheduler.schedule_after(Duration::from_secs(60), || println!("later"));
//! # }
//! ```

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::sync::Mutex;

const DEFAULT_WORKERS: usize = 2;

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Command {
    Schedule { at: Instant, job: Job },
    Shutdown,
}

struct Entry {
    at: Instant,
    seq: u64,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // reversed so the earliest deadline sits at the top of the heap
        other.at.cmp(&self.at).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A shared timer and worker pool for deferred rotation work.
///
/// Handles are cheap to clone; every clone schedules onto the same pool.
/// Threads stay up until [`shutdown`](Scheduler::shutdown) or process
/// exit.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

struct Shared {
    commands: Sender<Command>,
    instances: AtomicU64,
    shutdown: AtomicBool,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Starts the timer thread and the default worker pool.
    pub fn new() -> Scheduler {
        Scheduler::with_workers(DEFAULT_WORKERS)
    }

    /// Starts the timer thread and `workers` job threads (at least one).
    pub fn with_workers(workers: usize) -> Scheduler {
        let (command_tx, command_rx) = unbounded();
        let (job_tx, job_rx) = unbounded::<Job>();

        let mut threads = Vec::with_capacity(workers + 1);
        threads.push(
            thread::Builder::new()
                .name("tracing-rolling-timer".to_string())
                .spawn(move || timer_loop(command_rx, job_tx))
                .expect("failed to spawn `tracing-rolling` timer thread"),
        );
        for n in 0..workers.max(1) {
            let job_rx = job_rx.clone();
            threads.push(
                thread::Builder::new()
                    .name(format!("tracing-rolling-worker-{}", n))
                    .spawn(move || worker_loop(job_rx))
                    .expect("failed to spawn `tracing-rolling` worker thread"),
            );
        }

        Scheduler {
            shared: Arc::new(Shared {
                commands: command_tx,
                instances: AtomicU64::new(0),
                shutdown: AtomicBool::new(false),
                threads: Mutex::new(threads),
            }),
        }
    }

    /// Runs `job` on a worker thread once `delay` has elapsed.
    ///
    /// Submissions after [`shutdown`](Scheduler::shutdown) are dropped
    /// silently: the process must be shutting down, and the job would have
    /// been cancelled anyway.
    pub fn schedule_after(&self, delay: Duration, job: impl FnOnce() + Send + 'static) {
        if self.shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        let _ = self.shared.commands.send(Command::Schedule {
            at: Instant::now() + delay,
            job: Box::new(job),
        });
    }

    /// Hands out the creation-order sequence number jitter is derived
    /// from; monotonically increasing across appenders built against this
    /// scheduler.
    pub(crate) fn next_instance_seq(&self) -> u64 {
        self.shared.instances.fetch_add(1, Ordering::Relaxed)
    }

    /// Stops the timer, cancels timers that have not fired, and waits for
    /// in-flight jobs to finish.
    ///
    /// Must not be called from a scheduled job: the calling thread joins
    /// the pool's threads.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.shared.commands.send(Command::Shutdown);
        let mut threads = self.shared.threads.lock();
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("shutdown", &self.shared.shutdown.load(Ordering::Relaxed))
            .finish()
    }
}

fn timer_loop(commands: Receiver<Command>, jobs: Sender<Job>) {
    let mut pending: BinaryHeap<Entry> = BinaryHeap::new();
    let mut seq = 0u64;
    loop {
        // dispatch everything that is due, then sleep until the next
        // deadline or the next command
        let now = Instant::now();
        while pending.peek().map_or(false, |entry| entry.at <= now) {
            if let Some(entry) = pending.pop() {
                if jobs.send(entry.job).is_err() {
                    return;
                }
            }
        }

        let command = match pending.peek() {
            Some(entry) => {
                let timeout = entry.at.saturating_duration_since(Instant::now());
                match commands.recv_timeout(timeout) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            None => match commands.recv() {
                Ok(command) => command,
                Err(_) => return,
            },
        };

        match command {
            Command::Schedule { at, job } => {
                seq += 1;
                pending.push(Entry { at, seq, job });
            }
            // pending timers are cancelled, dispatched jobs run out
            Command::Shutdown => return,
        }
    }
}

fn worker_loop(jobs: Receiver<Job>) {
    for job in jobs {
        job();
    }
}
