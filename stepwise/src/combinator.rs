//! Tasks coordinating the joint completion of other tasks.
//!
//! [`all_of`] and [`any_of`] each return a task. On its first step the
//! combinator submits every listed task to the given scheduler, then waits
//! for its condition:
//!
//! - off the scheduler's worker, it blocks its own thread until a listed
//!   task completes and re-checks,
//! - on a worker thread, it suspends cooperatively so the worker keeps
//!   stepping the listed tasks.
//!
//! Neither combinator inspects results or cancels anything: listed tasks
//! keep their own outcomes and any-of leaves the losers running.

use crate::Scheduler;
use crate::channel::ErrorChannel;
use crate::error::{Error, Failure, SchedulerError};
use crate::runtime::context;
use crate::runtime::scheduler::core::Shared;
use crate::runtime::signal::Signal;
use crate::runtime::task::Task;
use crate::runtime::task::continuation::Steppable;
use crate::runtime::task::state::SUSPENDED_ON_YIELD;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Returns a task completing once every task in `tasks` has completed.
///
/// Completion order does not matter. An empty list completes on the first
/// step.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = Scheduler::new();
/// let joint = all_of(&scheduler, vec![odds.clone(), evens.clone()]);
///
/// joint.run_to_completion();
/// assert!(odds.is_complete() && evens.is_complete());
/// ```
pub fn all_of<T, C>(scheduler: &Scheduler, tasks: Vec<Task<T, C>>) -> Task<()>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    let joint = Joint::new(scheduler.shared(), &tasks, Mode::All);

    Task::new(async move {
        joint.submit()?;
        joint.await?;
        Ok(())
    })
}

/// Returns a task completing as soon as any task in `tasks` has completed.
///
/// The result is the index of the completed task; if several completed
/// before the combinator looked, the lowest index wins. The others keep
/// running and are never cancelled.
///
/// An empty list fails, since no task can ever complete.
pub fn any_of<T, C>(scheduler: &Scheduler, tasks: Vec<Task<T, C>>) -> Task<usize>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    let joint = Joint::new(scheduler.shared(), &tasks, Mode::Any);

    Task::new(async move {
        if joint.members.is_empty() {
            return Err(Failure::from(Error::new("any_of over an empty task list")));
        }

        joint.submit()?;
        let index = joint.await?;

        Ok(index)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    All,
    Any,
}

/// Waits for a joint completion condition over a group of tasks.
///
/// Resolves to the index of the first completed member in [`Mode::Any`],
/// and to `0` in [`Mode::All`].
struct Joint {
    shared: Arc<Shared>,
    members: Vec<Arc<dyn Steppable>>,
    mode: Mode,
    signal: Arc<Signal>,

    /// Whether the signal's waker has been handed to the members.
    registered: bool,
}

impl Joint {
    fn new<T, C>(shared: Arc<Shared>, tasks: &[Task<T, C>], mode: Mode) -> Self
    where
        T: Send + 'static,
        C: ErrorChannel<T>,
    {
        Self {
            shared,
            members: tasks.iter().map(Task::steppable).collect(),
            mode,
            signal: Signal::new(),
            registered: false,
        }
    }

    fn submit(&self) -> Result<(), SchedulerError> {
        for member in &self.members {
            self.shared.submit(member.clone(), false)?;
        }

        log::debug!("{:?} combinator submitted {} tasks", self.mode, self.members.len());
        Ok(())
    }

    fn check(&self) -> Option<usize> {
        match self.mode {
            Mode::All => self
                .members
                .iter()
                .all(|member| member.is_complete())
                .then_some(0),
            Mode::Any => self.members.iter().position(|member| member.is_complete()),
        }
    }

    fn register(&mut self) {
        if self.registered {
            return;
        }

        let waker = self.signal.waker();
        for member in &self.members {
            member.register_waiter(&waker);
        }

        self.registered = true;
    }
}

impl Future for Joint {
    type Output = Result<usize, SchedulerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            if let Some(index) = self.check() {
                return Poll::Ready(Ok(index));
            }

            if context::on_worker() {
                context::note_suspension(SUSPENDED_ON_YIELD);
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }

            if self.shared.queue.is_shut_down() {
                return Poll::Ready(Err(SchedulerError::Interrupted));
            }

            self.register();
            self.signal.wait_timeout(self.shared.idle_timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::yield_now::yield_now;

    fn counter(steps: usize) -> Task<usize> {
        Task::new(async move {
            for _ in 0..steps {
                yield_now().await;
            }
            Ok(steps)
        })
    }

    #[test]
    fn all_of_empty_completes_on_first_step() {
        let scheduler = Scheduler::new();
        let joint = all_of(&scheduler, Vec::<Task<usize>>::new());

        joint.step();

        assert!(joint.is_complete());
        assert_eq!(joint.result(), Some(Ok(())));
    }

    #[test]
    fn any_of_empty_fails() {
        let scheduler = Scheduler::new();
        let joint = any_of(&scheduler, Vec::<Task<usize>>::new());

        joint.step();

        let err = joint.result().unwrap().unwrap_err();
        assert!(err.message().contains("empty"));
    }

    #[test]
    fn all_of_waits_for_every_task() {
        let scheduler = Scheduler::new();
        let tasks = vec![counter(3), counter(10), counter(1)];

        let joint = all_of(&scheduler, tasks.clone());
        joint.run_to_completion();

        assert_eq!(joint.result(), Some(Ok(())));
        assert!(tasks.iter().all(Task::is_complete));
    }

    #[test]
    fn submission_waits_for_first_step() {
        let scheduler = Scheduler::new();
        let task = counter(1);

        let joint = all_of(&scheduler, vec![task.clone()]);
        assert_eq!(scheduler.queued(), 0);
        assert!(!task.is_complete());

        joint.run_to_completion();
        assert!(task.is_complete());
    }

    #[test]
    fn shut_down_scheduler_fails_the_combinator() {
        let scheduler = Scheduler::new();
        scheduler.shutdown();

        let joint = all_of(&scheduler, vec![counter(1)]);
        joint.run_to_completion();

        let err = joint.result().unwrap().unwrap_err();
        assert_eq!(err.message(), SchedulerError::ShutDown.to_string());
    }
}
