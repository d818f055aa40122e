use super::core::Task;
use super::state::TaskState;
use crate::channel::ErrorChannel;

use std::iter::FusedIterator;
use std::thread;

/// Lazy, single-pass sequence over the values a task produces.
///
/// Each advance steps the task until it publishes a new value or completes;
/// for a plain generator body that is exactly one step per value. The
/// sequence ends exactly when the task completes, so the body's final
/// return value is not part of it (read it with
/// [`Task::result`](crate::Task::result)). Iterating a completed task
/// yields nothing.
pub struct Iter<T, C: ErrorChannel<T>> {
    task: Task<T, C>,
    seen: u64,
}

impl<T, C> Iter<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    pub(crate) fn new(task: Task<T, C>) -> Self {
        let seen = task.produced();
        Self { task, seen }
    }
}

impl<T, C> Iterator for Iter<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
    C::Output: Clone,
{
    type Item = C::Output;

    fn next(&mut self) -> Option<C::Output> {
        while !self.task.is_complete() {
            self.task.step();

            if self.task.is_complete() {
                break;
            }

            let produced = self.task.produced();
            if produced != self.seen {
                self.seen = produced;
                return self.task.result();
            }

            // Another driver owns the body; let it make progress.
            if matches!(
                self.task.state(),
                TaskState::Running | TaskState::SuspendedOnExternalCallback
            ) {
                thread::yield_now();
            }
        }

        None
    }
}

impl<T, C> FusedIterator for Iter<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
    C::Output: Clone,
{
}
