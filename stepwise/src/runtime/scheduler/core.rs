use super::builder::SchedulerBuilder;
use super::queue::{Entry, Queue};
use super::worker::Worker;
use crate::channel::ErrorChannel;
use crate::error::SchedulerError;
use crate::runtime::context;
use crate::runtime::task::Task;
use crate::runtime::task::continuation::Steppable;
use crate::utils::lock;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Source of scheduler identifiers.
static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// The process-wide scheduler, created on first use.
static GLOBAL: OnceLock<Scheduler> = OnceLock::new();

/// State shared between a scheduler, its worker, and combinators holding a
/// handle to it.
pub(crate) struct Shared {
    pub(crate) id: usize,
    pub(crate) queue: Queue,
    pub(crate) idle_timeout: Duration,
}

impl Shared {
    /// Enqueues `task`, optionally parking the caller until it completes.
    pub(crate) fn submit(
        &self,
        task: Arc<dyn Steppable>,
        blocking: bool,
    ) -> Result<(), SchedulerError> {
        if blocking && context::on_worker_of(self.id) {
            return Err(SchedulerError::BlockingOnWorker);
        }

        let entry = Entry::new(task);
        let waiter = entry.waiter.clone();
        let task = entry.task.clone();

        self.queue
            .push(entry)
            .map_err(|_| SchedulerError::ShutDown)?;

        log::trace!("{} submitted to scheduler {}", task.id(), self.id);

        if !blocking {
            return Ok(());
        }

        waiter.wait_until(|| task.is_complete() || self.queue.is_shut_down());

        if task.is_complete() {
            Ok(())
        } else {
            Err(SchedulerError::Interrupted)
        }
    }
}

/// Background service stepping submitted tasks to completion.
///
/// A scheduler owns one worker thread and a FIFO run queue. The worker
/// gives every incomplete task one step per pass over the queue and drops
/// tasks once they complete. It never inspects a task's outcome: failures
/// are absorbed by each task's error channel. A task that never completes
/// is polled forever.
///
/// Schedulers are ordinary values: tests and libraries can construct their
/// own with [`Scheduler::new`] or [`Scheduler::builder`]. The process-wide
/// instance returned by [`Scheduler::global`] is created on first use and
/// must be shut down explicitly, since statics are never dropped.
///
/// Dropping a scheduler shuts it down: the worker is signaled and joined,
/// remaining entries are released, and blocked submitters are woken.
pub struct Scheduler {
    shared: Arc<Shared>,

    /// Join handle of the worker thread. Taken on shutdown.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates a scheduler with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the worker thread cannot be spawned. Use
    /// [`Scheduler::builder`] to handle that error instead.
    pub fn new() -> Self {
        SchedulerBuilder::new()
            .build()
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Returns a builder for a custom scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    /// Returns the process-wide scheduler, creating it on first use.
    pub fn global() -> &'static Scheduler {
        GLOBAL.get_or_init(Scheduler::new)
    }

    pub(crate) fn start(config: SchedulerBuilder) -> Result<Self, SchedulerError> {
        let shared = Arc::new(Shared {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            queue: Queue::new(),
            idle_timeout: config.idle_timeout,
        });

        let worker = Worker::new(shared.clone());

        let mut builder = thread::Builder::new().name(config.thread_name);
        if let Some(bytes) = config.stack_size {
            builder = builder.stack_size(bytes);
        }

        let handle = builder.spawn(move || worker.run())?;

        log::debug!("scheduler {} started", shared.id);

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Submits `task` to the run queue.
    ///
    /// With `blocking == false` this returns immediately. With
    /// `blocking == true` the calling thread parks until the task is
    /// observed complete.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::ShutDown`] if the scheduler no longer accepts work,
    /// - [`SchedulerError::Interrupted`] if it shut down during a blocking wait,
    /// - [`SchedulerError::BlockingOnWorker`] for a blocking submission made
    ///   from this scheduler's own worker thread.
    pub fn schedule<T, C>(&self, task: &Task<T, C>, blocking: bool) -> Result<(), SchedulerError>
    where
        T: Send + 'static,
        C: ErrorChannel<T>,
    {
        self.shared.submit(task.steppable(), blocking)
    }

    /// Number of entries currently in the run queue.
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.queue.is_shut_down()
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Calling this more than once is harmless. When called from the
    /// worker thread itself (inside a task body), the worker exits after
    /// the current step and is joined by the next `shutdown` or drop from
    /// another thread.
    pub fn shutdown(&self) {
        if self.shared.queue.shutdown() {
            log::debug!("scheduler {} shutting down", self.shared.id);
        }

        let mut worker = lock(&self.worker);
        let Some(handle) = worker.take() else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            *worker = Some(handle);
            return;
        }
        drop(worker);

        if handle.join().is_err() {
            log::warn!("scheduler {} worker panicked", self.shared.id);
        }
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        self.shared.clone()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
