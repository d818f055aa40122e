use super::continuation::{ContinuationRef, StepOutcome, Steppable, TaskId};
use super::handle::Await;
use super::iter::Iter;
use super::state::{
    self, COMPLETED, RUNNING, SUSPENDED_ON_CALLBACK, SUSPENDED_ON_YIELD, TaskState,
};
use super::yielder::Yielder;
use crate::channel::{ErrorChannel, Single};
use crate::error::{Error, Failure};
use crate::runtime::context;
use crate::utils::lock;

use std::cell::UnsafeCell;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::task::{Context, Poll, Waker};
use std::thread;

/// A task body: an erased future resolving to the body's final outcome.
type Body<T> = Pin<Box<dyn Future<Output = Result<T, Failure>> + Send>>;

/// The result slot of a task.
///
/// Shared between the record and the task's [`Yielder`], which publishes
/// intermediate values into it.
pub(crate) struct Slot<O> {
    value: Mutex<Option<O>>,

    /// Number of values published so far. Lets lazy sequences tell a fresh
    /// value from one they already handed out.
    produced: AtomicU64,
}

impl<O> Slot<O> {
    pub(crate) fn new() -> Self {
        Self {
            value: Mutex::new(None),
            produced: AtomicU64::new(0),
        }
    }

    pub(crate) fn publish(&self, value: O) {
        *lock(&self.value) = Some(value);
        self.produced.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn produced(&self) -> u64 {
        self.produced.load(Ordering::Acquire)
    }

    fn take(&self) -> Option<O> {
        lock(&self.value).take()
    }

    fn update(&self, f: impl FnOnce(&mut Option<O>)) {
        f(&mut lock(&self.value));
    }
}

impl<O: Clone> Slot<O> {
    fn get(&self) -> Option<O> {
        lock(&self.value).clone()
    }
}

/// Per-task continuation record.
///
/// Owned through an `Arc` by every [`Task`] handle and by any scheduler
/// queue entry referencing the task, so it is torn down exactly once, after
/// the last of them is released.
pub(crate) struct Record<T, C: ErrorChannel<T>> {
    /// The suspended body. `None` once the task completed.
    ///
    /// Only touched by the driver that moved `state` to `RUNNING`.
    body: UnsafeCell<Option<Body<T>>>,

    slot: Arc<Slot<C::Output>>,

    /// Raw lifecycle state (see [`state`]). `COMPLETED` is terminal.
    state: AtomicUsize,

    /// Suspension state to enter if the current step ends in `Pending`.
    reason: AtomicUsize,

    /// Continuation of the task awaiting this one. Set at most once.
    caller: Mutex<Option<ContinuationRef>>,

    /// `true` until the task is awaited from inside another task body.
    launched_directly: AtomicBool,

    /// Wakers notified on completion.
    waiters: Mutex<Vec<Waker>>,

    _channel: PhantomData<fn() -> C>,
}

// Safety: the body is only accessed by the single driver that won the
// compare-exchange into `RUNNING`; every other field is synchronized.
unsafe impl<T: Send, C: ErrorChannel<T>> Sync for Record<T, C> {}

impl<T, C> Record<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    fn new(body: Body<T>, slot: Arc<Slot<C::Output>>) -> Self {
        Self {
            body: UnsafeCell::new(Some(body)),
            slot,
            state: AtomicUsize::new(state::NOT_STARTED),
            reason: AtomicUsize::new(SUSPENDED_ON_YIELD),
            caller: Mutex::new(None),
            launched_directly: AtomicBool::new(true),
            waiters: Mutex::new(Vec::new()),
            _channel: PhantomData,
        }
    }

    fn task_id(&self) -> TaskId {
        TaskId(self as *const Self as *const () as usize)
    }

    fn continuation(self: &Arc<Self>) -> ContinuationRef {
        let target: Weak<dyn Steppable> = Arc::downgrade(self) as Weak<dyn Steppable>;
        ContinuationRef::new(self.task_id(), target)
    }

    fn completed(&self) -> bool {
        self.state.load(Ordering::Acquire) == COMPLETED
    }

    /// Records `caller` as the continuation to resume on completion.
    ///
    /// Only the first caller is kept.
    pub(crate) fn link_caller(&self, caller: ContinuationRef) {
        if caller.id() == self.task_id() {
            return;
        }

        let mut link = lock(&self.caller);
        if link.is_none() {
            log::trace!("{} awaited by {}", self.task_id(), caller.id());
            *link = Some(caller);
            self.launched_directly.store(false, Ordering::Release);
        }
    }

    /// Returns a copy of the final result, leaving the slot in place.
    pub(crate) fn output(&self) -> C::Output
    where
        C::Output: Clone,
    {
        self.slot.get().unwrap_or_else(C::vacant)
    }

    /// Resumes the body from its last suspension point.
    ///
    /// The driver first claims the body by moving the state to `RUNNING`.
    /// A completed task is left untouched, and a task owned by another
    /// driver is reported as still suspended.
    pub(crate) fn run_step(self: Arc<Self>) -> StepOutcome {
        let current = self.state.load(Ordering::Acquire);

        if current == COMPLETED {
            return StepOutcome::ReturnToDriver;
        }

        if !state::is_resumable(current)
            || self
                .state
                .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return StepOutcome::StillSuspended;
        }

        self.reason.store(SUSPENDED_ON_YIELD, Ordering::Relaxed);

        let poll = context::enter_task(self.continuation(), || {
            // Safety: the RUNNING state guarantees no other driver touches the body.
            let body = unsafe { &mut *self.body.get() };

            let Some(future) = body.as_mut() else {
                let error = Error::new("task body already consumed");
                return Poll::Ready(Err(Failure::from(error)));
            };

            let mut cx = Context::from_waker(Waker::noop());

            // A panic is a failure like any other: it is caught here, at the
            // boundary closest to where it was raised.
            panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)))
                .unwrap_or_else(|payload| Poll::Ready(Err(Error::from_panic(payload).into())))
        });

        match poll {
            Poll::Pending => {
                let reason = self.reason.load(Ordering::Relaxed);
                self.state.store(reason, Ordering::Release);
                log::trace!("{} suspended ({:?})", self.task_id(), TaskState::from_raw(reason));
                StepOutcome::StillSuspended
            }
            Poll::Ready(outcome) => self.complete(outcome),
        }
    }

    /// Stores the body's outcome, marks the task complete, and decides who
    /// runs next.
    fn complete(&self, outcome: Result<T, Failure>) -> StepOutcome {
        // Safety: still RUNNING; release the body's captures right away.
        drop(unsafe { (*self.body.get()).take() });

        match outcome {
            Ok(value) => self.slot.publish(C::success(value)),
            Err(failure) => self.slot.update(|slot| C::failure(failure, slot)),
        }

        self.state.store(COMPLETED, Ordering::Release);
        log::trace!("{} completed", self.task_id());

        let waiters = mem::take(&mut *lock(&self.waiters));
        for waker in waiters {
            waker.wake();
        }

        if self.launched_directly.load(Ordering::Acquire) {
            return StepOutcome::ReturnToDriver;
        }

        match lock(&self.caller).clone() {
            Some(caller) => StepOutcome::ResumeCaller(caller),
            None => StepOutcome::ReturnToDriver,
        }
    }
}

impl<T, C> Steppable for Record<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    fn step(self: Arc<Self>) -> StepOutcome {
        self.run_step()
    }

    fn is_complete(&self) -> bool {
        self.completed()
    }

    fn id(&self) -> TaskId {
        self.task_id()
    }

    fn register_waiter(&self, waker: &Waker) {
        let mut waiters = lock(&self.waiters);

        // Checked under the waiter lock: completion publishes the state
        // before draining, so the waker is either drained or woken here.
        if self.completed() {
            drop(waiters);
            waker.wake_by_ref();
            return;
        }

        waiters.push(waker.clone());
    }

    fn note_suspension(&self, reason: usize) {
        self.reason.store(reason, Ordering::Relaxed);
    }

    fn set_blocked_on_callback(&self, blocked: bool) {
        let (from, to) = if blocked {
            (RUNNING, SUSPENDED_ON_CALLBACK)
        } else {
            (SUSPENDED_ON_CALLBACK, RUNNING)
        };

        let _ = self
            .state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire);
    }
}

/// A resumable unit of work producing a value or a failure.
///
/// A task owns a continuation record holding its suspended body, its result
/// slot, and the link to the task awaiting it. Cloning a `Task` shares the
/// record; the record is released when the last handle (including any
/// held by a scheduler queue) is dropped.
///
/// The body does not run at construction. It advances only when driven:
/// by [`step`](Self::step), by the [`Scheduler`](crate::Scheduler), by
/// iterating it, or by being awaited from another task's body.
///
/// `C` is the [`ErrorChannel`] deciding how failures appear in the result.
///
/// # Examples
///
/// ```rust,ignore
/// use stepwise::Task;
///
/// let inner = || Task::<i32>::new(async { Ok(10) });
/// let outer = Task::<i32>::new(async move {
///     let x = inner().await?;
///     Ok(x * 2)
/// });
///
/// outer.step();
/// assert_eq!(outer.result(), Some(Ok(20)));
/// ```
pub struct Task<T, C: ErrorChannel<T> = Single> {
    pub(crate) record: Arc<Record<T, C>>,
}

impl<T, C> Task<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    /// Creates a task from a body. The body has not executed yet.
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        Self::from_parts(Box::pin(body), Arc::new(Slot::new()))
    }

    /// Creates a generator-style task.
    ///
    /// `body` receives a [`Yielder`] through which it publishes intermediate
    /// values; each `yield_value(..).await` suspends the body once.
    ///
    /// ```rust,ignore
    /// let counter = Task::<u32, Discard>::generator(|co| async move {
    ///     for n in 0..3 {
    ///         co.yield_value(n).await;
    ///     }
    ///     Ok(3)
    /// });
    /// assert_eq!(counter.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    /// ```
    pub fn generator<B, F>(body: B) -> Self
    where
        B: FnOnce(Yielder<T, C>) -> F,
        F: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        let slot = Arc::new(Slot::new());
        let future = body(Yielder::new(slot.clone()));

        Self::from_parts(Box::pin(future), slot)
    }

    fn from_parts(body: Body<T>, slot: Arc<Slot<C::Output>>) -> Self {
        Self {
            record: Arc::new(Record::new(body, slot)),
        }
    }

    /// Resumes the body from its last suspension point.
    ///
    /// Stepping a completed task is a no-op. If another thread is stepping
    /// the task at the same moment, this call does nothing and reports
    /// [`StepOutcome::StillSuspended`].
    pub fn step(&self) -> StepOutcome {
        self.record.clone().run_step()
    }

    /// Steps the task on the current thread until it completes.
    pub fn run_to_completion(&self) {
        while !self.is_complete() {
            self.step();

            if matches!(
                self.state(),
                TaskState::Running | TaskState::SuspendedOnExternalCallback
            ) {
                thread::yield_now();
            }
        }
    }

    /// Returns `true` once the body returned or failed. Never reverts.
    pub fn is_complete(&self) -> bool {
        self.record.completed()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> TaskState {
        TaskState::from_raw(self.record.state.load(Ordering::Acquire))
    }

    /// Returns a copy of the current result slot.
    ///
    /// Before completion this is the last yielded value, or `None` if the
    /// body has produced nothing yet. After completion it is the final
    /// outcome under the task's error channel.
    pub fn result(&self) -> Option<C::Output>
    where
        C::Output: Clone,
    {
        self.record.slot.get()
    }

    /// Moves the current result out of the slot, leaving it empty.
    pub fn take_result(&self) -> Option<C::Output> {
        self.record.slot.take()
    }

    /// Returns the task's identity.
    pub fn id(&self) -> TaskId {
        self.record.task_id()
    }

    /// Returns the continuation of the task awaiting this one, if any.
    pub fn caller(&self) -> Option<ContinuationRef> {
        lock(&self.record.caller).clone()
    }

    /// Returns `true` if the task was never awaited from another task.
    pub fn is_launched_directly(&self) -> bool {
        self.record.launched_directly.load(Ordering::Acquire)
    }

    /// Returns a lazy sequence over the values the task produces.
    pub fn iter(&self) -> Iter<T, C> {
        Iter::new(self.clone())
    }

    pub(crate) fn produced(&self) -> u64 {
        self.record.slot.produced()
    }

    pub(crate) fn steppable(&self) -> Arc<dyn Steppable> {
        self.record.clone()
    }
}

impl<T, C: ErrorChannel<T>> Clone for Task<T, C> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
        }
    }
}

impl<T, C> fmt::Debug for Task<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

impl<T, C> IntoFuture for Task<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
    C::Output: Clone,
{
    type Output = C::Output;
    type IntoFuture = Await<T, C>;

    /// Awaits the task from inside another task's body.
    ///
    /// The awaiting task is linked as the caller and the awaited task is
    /// stepped immediately, without a scheduler hop. Every awaiter gets a
    /// copy of the final result.
    fn into_future(self) -> Self::IntoFuture {
        Await::new(self)
    }
}

impl<T, C> IntoIterator for Task<T, C>
where
    T: Send + 'static,
    C: ErrorChannel<T>,
    C::Output: Clone,
{
    type Item = C::Output;
    type IntoIter = Iter<T, C>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(self)
    }
}
