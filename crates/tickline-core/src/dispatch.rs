//! Worker dispatch.
//!
//! Hands work units to background threads without blocking the submitter.
//! Two modes are available:
//!
//! - [`DispatchMode::PerRequest`] (default): every request gets its own named
//!   thread. Concurrency is unbounded, which suits the low to medium volume
//!   a host plugin typically issues.
//! - [`DispatchMode::Pool`]: a fixed set of worker threads fed through a
//!   bounded channel. A full channel rejects the submission instead of
//!   queueing without limit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{RequestError, Result};
use crate::logging::targets;
use crate::sink::RequestId;

/// Default capacity for the pool's job queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default number of pool workers.
const DEFAULT_POOL_WORKERS: usize = 4;

/// How work units are mapped onto threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum DispatchMode {
    /// Spawn one thread per request.
    #[default]
    PerRequest,
    /// Run requests on a fixed pool with a bounded job queue.
    Pool {
        /// Number of worker threads.
        workers: usize,
        /// Maximum number of queued jobs before submissions are rejected.
        queue_capacity: usize,
    },
}

impl DispatchMode {
    /// A pool with default worker count and queue capacity.
    pub fn pool() -> Self {
        Self::Pool {
            workers: DEFAULT_POOL_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// A unit of background work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Thread settings shared by both dispatch modes.
#[derive(Clone, Debug)]
pub(crate) struct ThreadSettings {
    pub name: String,
    pub stack_size: Option<usize>,
}

impl ThreadSettings {
    fn builder(&self, suffix: impl std::fmt::Display) -> thread::Builder {
        let mut builder = thread::Builder::new().name(format!("{}-{suffix}", self.name));
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder
    }
}

/// Runs jobs off the calling thread.
pub(crate) struct Dispatcher {
    settings: ThreadSettings,
    pool: Option<WorkerPool>,
}

impl Dispatcher {
    /// Create a dispatcher, starting pool threads if the mode needs them.
    pub fn new(mode: DispatchMode, settings: ThreadSettings) -> Result<Self> {
        let pool = match mode {
            DispatchMode::PerRequest => None,
            DispatchMode::Pool {
                workers,
                queue_capacity,
            } => Some(WorkerPool::start(&settings, workers.max(1), queue_capacity.max(1))?),
        };
        Ok(Self { settings, pool })
    }

    /// Run a job in the background.
    ///
    /// Returns immediately. On error the job has been dropped without
    /// running.
    pub fn run(&self, id: RequestId, job: Job) -> Result<()> {
        match &self.pool {
            None => self.spawn(id, job),
            Some(pool) => pool.submit(job),
        }
    }

    fn spawn(&self, id: RequestId, job: Job) -> Result<()> {
        self.settings
            .builder(id.as_u64())
            .spawn(job)
            .map(drop)
            .map_err(|err| {
                tracing::error!(target: targets::DISPATCH, %id, "failed to spawn request thread: {}", err);
                RequestError::Spawn(err.to_string())
            })
    }

    /// Stop accepting jobs. Pool workers drop any job still queued.
    ///
    /// Does not wait for running jobs.
    pub fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.shutdown();
        }
    }
}

/// Fixed set of worker threads sharing a bounded job channel.
struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    stopped: Arc<AtomicBool>,
}

impl WorkerPool {
    fn start(settings: &ThreadSettings, workers: usize, capacity: usize) -> Result<Self> {
        let (sender, receiver) = bounded::<Job>(capacity);
        let stopped = Arc::new(AtomicBool::new(false));

        for index in 0..workers {
            let receiver = receiver.clone();
            let stopped = stopped.clone();
            // Pool threads are detached; they exit once the sender is dropped.
            settings
                .builder(format!("pool-{index}"))
                .spawn(move || pool_loop(receiver, stopped))
                .map_err(|err| RequestError::Spawn(err.to_string()))?;
        }

        tracing::debug!(target: targets::DISPATCH, workers, capacity, "request pool started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            stopped,
        })
    }

    fn submit(&self, job: Job) -> Result<()> {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(RequestError::ShutDown);
        };
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(RequestError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(RequestError::ShutDown),
        }
    }

    fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        // Dropping the sender disconnects the channel so idle workers exit.
        self.sender.lock().take();
    }
}

fn pool_loop(receiver: Receiver<Job>, stopped: Arc<AtomicBool>) {
    while let Ok(job) = receiver.recv() {
        if stopped.load(Ordering::Acquire) {
            // Abandoned: dropping the job drops its sink uninvoked.
            drop(job);
            continue;
        }
        job();
    }
}
