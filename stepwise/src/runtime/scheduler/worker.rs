use super::core::Shared;
use crate::runtime::context;
use crate::runtime::task::continuation::StepOutcome;

use std::sync::Arc;

/// The scheduler's background worker.
///
/// The worker repeatedly takes the head of the run queue and:
/// 1. retires it if its task is complete, waking any blocked submitter,
/// 2. otherwise requeues it at the tail and steps its task once.
///
/// Every incomplete task therefore gets one step per full pass over the
/// queue. A task whose step completes it while it is being awaited hands
/// control straight to its caller.
pub(crate) struct Worker {
    shared: Arc<Shared>,
}

impl Worker {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Runs the worker loop until shutdown.
    pub(crate) fn run(&self) {
        context::enter_worker(self.shared.id, || self.run_loop());
    }

    fn run_loop(&self) {
        let queue = &self.shared.queue;
        log::debug!("scheduler {} worker started", self.shared.id);

        loop {
            if queue.is_shut_down() {
                break;
            }

            let Some(entry) = queue.pop() else {
                queue.park(self.shared.idle_timeout);
                continue;
            };

            if entry.task.is_complete() {
                log::trace!("{} retired from scheduler {}", entry.task.id(), self.shared.id);
                entry.waiter.notify_all();
                continue;
            }

            if queue.push(entry.clone()).is_err() {
                entry.waiter.notify_all();
                break;
            }

            let mut outcome = entry.task.clone().step();

            while let StepOutcome::ResumeCaller(caller) = outcome {
                log::trace!("resuming awaiting caller {}", caller.id());
                outcome = caller.resume().unwrap_or(StepOutcome::ReturnToDriver);
            }
        }

        for entry in queue.drain() {
            entry.waiter.notify_all();
        }

        log::debug!("scheduler {} worker stopped", self.shared.id);
    }
}
