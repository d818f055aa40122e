use super::core::Task;
use super::state::SUSPENDED_ON_SUBTASK;
use crate::channel::ErrorChannel;
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by awaiting a [`Task`].
///
/// Polling it links the polling task as the awaited task's caller, then
/// drives the awaited task one step on the spot. When that step completes
/// the awaited task, its result is handed straight back to the caller's
/// body in the same poll; otherwise the caller suspends on the subtask and
/// the next step of the caller drives the subtask again.
///
/// The result is copied out of the awaited task's slot, so other handles
/// and later awaiters still see it. [`Task::take_result`] moves it out.
pub struct Await<T, C: ErrorChannel<T>> {
    task: Task<T, C>,
}

impl<T, C> Await<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    pub(crate) fn new(task: Task<T, C>) -> Self {
        Self { task }
    }
}

impl<T, C> Future for Await<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
    C::Output: Clone,
{
    type Output = C::Output;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<C::Output> {
        let record = &self.task.record;

        if !self.task.is_complete() {
            if let Some(caller) = context::current_task() {
                record.link_caller(caller);
            }

            // The outcome needs no handling here: if this step completes the
            // task, the caller is the body polling us and simply continues.
            let _ = record.clone().run_step();
        }

        if self.task.is_complete() {
            return Poll::Ready(record.output());
        }

        context::note_suspension(SUSPENDED_ON_SUBTASK);
        Poll::Pending
    }
}
