//! Callback bridge.
//!
//! Adapts an operation that reports completion through a callback, possibly
//! from another thread, into a call a task body can make as if it were
//! synchronous:
//!
//! ```rust,ignore
//! use stepwise::bridge::{self, Handle};
//!
//! extern "C" fn on_done(value: i32, user_data: *mut c_void) {
//!     let handle = unsafe { Handle::<i32>::from_user_data(user_data) };
//!     handle.resume(value);
//! }
//!
//! let io = Task::<i32>::new(async {
//!     let handle = bridge::create_handle::<i32>();
//!     unsafe { legacy_read(10, on_done, handle.clone().into_user_data()) };
//!     Ok(handle.suspend()?)
//! });
//! ```
//!
//! [`Handle::suspend`] blocks the calling OS thread until the callback
//! fires, so every outstanding external call holds one thread.

use crate::error::Error;
use crate::runtime::context;
use crate::runtime::task::continuation::Steppable;
use crate::utils::lock;

use std::ffi::c_void;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// Outcome delivered by the external callback.
struct Completion<T> {
    completed: bool,
    outcome: Option<Result<T, Error>>,
}

/// One suspend/resume round-trip with an external callback.
///
/// The flag and the outcome live under the same lock. [`suspend`] checks the
/// flag before parking and on every wakeup, so a [`resume`] issued before
/// the wait begins is never lost.
///
/// [`suspend`]: Handle::suspend
/// [`resume`]: Handle::resume
pub struct Handle<T> {
    completion: Mutex<Completion<T>>,
    condvar: Condvar,
    suspended: AtomicBool,
}

impl<T: Send> Handle<T> {
    /// Creates a handle for one external call.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            completion: Mutex::new(Completion {
                completed: false,
                outcome: None,
            }),
            condvar: Condvar::new(),
            suspended: AtomicBool::new(false),
        })
    }

    /// Blocks the calling thread until the callback reports back.
    ///
    /// When called from a task body, the task reports
    /// [`TaskState::SuspendedOnExternalCallback`](crate::TaskState::SuspendedOnExternalCallback)
    /// for the duration of the wait.
    ///
    /// # Errors
    ///
    /// Returns the error delivered through
    /// [`resume_with_error`](Self::resume_with_error), or an error if this
    /// handle was already suspended on.
    pub fn suspend(&self) -> Result<T, Error> {
        if self.suspended.swap(true, Ordering::AcqRel) {
            return Err(Error::new("callback handle already suspended on"));
        }

        let task = context::current_task().and_then(|task| task.upgrade());
        mark_blocked(task.as_deref(), true);

        let guard = lock(&self.completion);
        let mut completion = self
            .condvar
            .wait_while(guard, |completion| !completion.completed)
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let outcome = completion.outcome.take();
        drop(completion);

        mark_blocked(task.as_deref(), false);

        outcome.unwrap_or_else(|| Err(Error::new("callback completed without an outcome")))
    }

    /// Delivers `value` and wakes the suspended thread.
    ///
    /// Only the first delivery counts; later ones are ignored.
    pub fn resume(&self, value: T) {
        self.deliver(Ok(value));
    }

    /// Delivers a failure reported by the external operation.
    pub fn resume_with_error(&self, code: i32, message: impl Into<String>) {
        self.deliver(Err(Error::with_code(code, message)));
    }

    /// Returns `true` once a value or an error has been delivered.
    pub fn is_completed(&self) -> bool {
        lock(&self.completion).completed
    }

    fn deliver(&self, outcome: Result<T, Error>) {
        let mut completion = lock(&self.completion);

        if completion.completed {
            log::warn!("callback handle resumed twice; ignoring the second outcome");
            return;
        }

        completion.outcome = Some(outcome);
        completion.completed = true;
        drop(completion);

        self.condvar.notify_one();
    }

    /// Converts the handle into an opaque pointer for a C-style callback API.
    ///
    /// The pointer owns one reference; pass it back to
    /// [`from_user_data`](Self::from_user_data) exactly once.
    pub fn into_user_data(self: Arc<Self>) -> *mut c_void {
        Arc::into_raw(self) as *mut c_void
    }

    /// Recovers a handle from a pointer made by
    /// [`into_user_data`](Self::into_user_data).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `Handle::<T>::into_user_data` with the same `T`
    /// and must not have been recovered before.
    pub unsafe fn from_user_data(ptr: *mut c_void) -> Arc<Self> {
        unsafe { Arc::from_raw(ptr as *const Self) }
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("completed", &lock(&self.completion).completed)
            .field("suspended", &self.suspended.load(Ordering::Acquire))
            .finish()
    }
}

fn mark_blocked(task: Option<&dyn Steppable>, blocked: bool) {
    if let Some(task) = task {
        task.set_blocked_on_callback(blocked);
    }
}

/// Creates a handle for one external call.
pub fn create_handle<T: Send>() -> Arc<Handle<T>> {
    Handle::new()
}

/// Blocks until `handle` is resumed. See [`Handle::suspend`].
pub fn suspend<T: Send>(handle: &Handle<T>) -> Result<T, Error> {
    handle.suspend()
}

/// Delivers `value` to `handle`. See [`Handle::resume`].
pub fn resume<T: Send>(value: T, handle: &Handle<T>) {
    handle.resume(value);
}

/// Delivers an external failure to `handle`. See [`Handle::resume_with_error`].
pub fn resume_with_error<T: Send>(code: i32, message: impl Into<String>, handle: &Handle<T>) {
    handle.resume_with_error(code, message);
}
