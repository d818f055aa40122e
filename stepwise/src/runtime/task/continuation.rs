use std::fmt;
use std::sync::{Arc, Weak};
use std::task::Waker;

/// Identity of a task: the address of its continuation record.
///
/// Ids are unique among live tasks. An id may be reused once every handle
/// to a task has been dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{:#x}", self.0)
    }
}

/// What the driver of a step should do next.
///
/// Returned by [`Task::step`](crate::Task::step). This is the explicit form
/// of symmetric transfer: a callee that completes while being awaited names
/// its caller instead of returning to whoever happened to step it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The task completed while awaited; its caller should run next.
    ResumeCaller(ContinuationRef),
    /// Nothing else needs to run: the task completed with no caller, or it
    /// was already complete.
    ReturnToDriver,
    /// The task is suspended (or another driver currently owns it).
    StillSuspended,
}

/// A type-erased, steppable task record.
///
/// The scheduler queue, continuation links, and combinators all handle
/// tasks through this trait so they can mix tasks of different value types
/// and error channels.
pub(crate) trait Steppable: Send + Sync {
    /// Resumes the body once. See [`Task::step`](crate::Task::step).
    fn step(self: Arc<Self>) -> StepOutcome;

    fn is_complete(&self) -> bool;

    fn id(&self) -> TaskId;

    /// Registers a waker notified once the task completes.
    ///
    /// A waker registered on an already completed task is woken at once.
    fn register_waiter(&self, waker: &Waker);

    /// Records why the body is about to return `Pending`.
    fn note_suspension(&self, reason: usize);

    /// Flags (or clears) the running body as blocked on a callback bridge.
    fn set_blocked_on_callback(&self, blocked: bool);
}

/// A non-owning reference to a task's continuation.
///
/// Stored as the caller link of an awaited task. Holding one does not keep
/// the task alive, so caller and callee never form a reference cycle.
#[derive(Clone)]
pub struct ContinuationRef {
    id: TaskId,
    target: Weak<dyn Steppable>,
}

impl ContinuationRef {
    pub(crate) fn new(id: TaskId, target: Weak<dyn Steppable>) -> Self {
        Self { id, target }
    }

    /// Id of the task this continuation belongs to.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Steps the referenced task.
    ///
    /// Returns `None` if the task has already been dropped.
    pub fn resume(&self) -> Option<StepOutcome> {
        self.target.upgrade().map(|task| task.step())
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<dyn Steppable>> {
        self.target.upgrade()
    }
}

impl PartialEq for ContinuationRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContinuationRef {}

impl fmt::Debug for ContinuationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContinuationRef").field(&self.id).finish()
    }
}
