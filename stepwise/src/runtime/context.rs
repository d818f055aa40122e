use crate::runtime::task::continuation::ContinuationRef;

use std::cell::{Cell, RefCell};

thread_local! {
    /// Continuation of the task whose body is being polled on this thread.
    ///
    /// Set for the duration of a step. Awaiting another task reads it to
    /// link the awaited task back to its caller.
    static CURRENT_TASK: RefCell<Option<ContinuationRef>> = const { RefCell::new(None) };

    /// Identifier of the scheduler whose worker loop runs on this thread.
    static CURRENT_WORKER: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Runs `f` with `task` installed as the current task of this thread.
///
/// The previous current task is restored afterwards, so nested steps (a
/// body eagerly driving the task it awaits) unwind correctly.
pub(crate) fn enter_task<R>(task: ContinuationRef, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_TASK.with(|cell| cell.replace(Some(task)));

    let out = f();

    CURRENT_TASK.with(|cell| cell.replace(prev));

    out
}

/// Returns the continuation of the task currently being stepped, if any.
pub(crate) fn current_task() -> Option<ContinuationRef> {
    CURRENT_TASK.with(|cell| cell.borrow().clone())
}

/// Records on the current task why its body is about to suspend.
pub(crate) fn note_suspension(reason: usize) {
    if let Some(task) = current_task().and_then(|task| task.upgrade()) {
        task.note_suspension(reason);
    }
}

/// Marks this thread as the worker of scheduler `id` while `f` runs.
pub(crate) fn enter_worker<R>(id: usize, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_WORKER.with(|cell| cell.replace(Some(id)));

    let out = f();

    CURRENT_WORKER.with(|cell| cell.set(prev));

    out
}

/// Returns `true` if this thread is a scheduler worker.
pub(crate) fn on_worker() -> bool {
    CURRENT_WORKER.with(|cell| cell.get().is_some())
}

/// Returns `true` if this thread is the worker of scheduler `id`.
pub(crate) fn on_worker_of(id: usize) -> bool {
    CURRENT_WORKER.with(|cell| cell.get() == Some(id))
}
