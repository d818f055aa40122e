use crate::runtime::task::continuation::Steppable;
use crate::utils::lock;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Lock and condition variable a blocking submitter parks on.
pub(crate) struct Waiter {
    lock: Mutex<()>,
    condvar: Condvar,
}

impl Waiter {
    fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    /// Wakes every thread parked on this entry.
    pub(crate) fn notify_all(&self) {
        let _guard = lock(&self.lock);
        self.condvar.notify_all();
    }

    /// Parks until `done` holds. `done` is evaluated under the lock, both
    /// before parking and after every wakeup.
    pub(crate) fn wait_until(&self, done: impl Fn() -> bool) {
        let guard = lock(&self.lock);

        let _guard = self
            .condvar
            .wait_while(guard, |_| !done())
            .unwrap_or_else(|poisoned| poisoned.into_inner());
    }
}

/// A submitted task paired with the waiter of its submitter.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) task: Arc<dyn Steppable>,
    pub(crate) waiter: Arc<Waiter>,
}

impl Entry {
    pub(crate) fn new(task: Arc<dyn Steppable>) -> Self {
        Self {
            task,
            waiter: Arc::new(Waiter::new()),
        }
    }
}

/// FIFO run queue shared by submitters and the worker.
///
/// The worker parks on the queue's condition variable while it is empty
/// and is woken by the next push or by shutdown.
pub(crate) struct Queue {
    entries: Mutex<VecDeque<Entry>>,
    condvar: Condvar,

    /// Only flipped while holding `entries`, so no push can slip in after
    /// the final drain.
    shutdown: AtomicBool,
}

impl Queue {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Appends an entry at the tail.
    ///
    /// Hands the entry back if the queue has been shut down.
    pub(crate) fn push(&self, entry: Entry) -> Result<(), Entry> {
        let mut entries = lock(&self.entries);

        if self.shutdown.load(Ordering::Acquire) {
            return Err(entry);
        }

        entries.push_back(entry);
        drop(entries);

        self.condvar.notify_one();
        Ok(())
    }

    /// Removes the entry at the head.
    pub(crate) fn pop(&self) -> Option<Entry> {
        lock(&self.entries).pop_front()
    }

    /// Parks the worker until an entry is pushed, shutdown is signaled, or
    /// `timeout` elapses.
    pub(crate) fn park(&self, timeout: Duration) {
        let entries = lock(&self.entries);

        let _entries = self
            .condvar
            .wait_timeout_while(entries, timeout, |entries| {
                entries.is_empty() && !self.shutdown.load(Ordering::Acquire)
            })
            .unwrap_or_else(|poisoned| poisoned.into_inner());
    }

    /// Signals shutdown and wakes the worker.
    ///
    /// Returns `false` if the queue was already shut down.
    pub(crate) fn shutdown(&self) -> bool {
        let entries = lock(&self.entries);
        let first = !self.shutdown.swap(true, Ordering::AcqRel);
        drop(entries);

        self.condvar.notify_all();
        first
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Removes every remaining entry.
    pub(crate) fn drain(&self) -> Vec<Entry> {
        lock(&self.entries).drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.entries).len()
    }
}
