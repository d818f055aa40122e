//! # Stepwise
//!
//! **Stepwise** is a minimal task runtime for Rust: computations are written
//! as ordinary `async` bodies with suspension points and advanced one step at
//! a time by whoever drives them.
//!
//! Unlike general-purpose runtimes, Stepwise has no reactor, no timers and no
//! I/O of its own. It focuses on the pieces needed to fold legacy,
//! callback-driven operations into sequential-looking code:
//!
//! - **Tasks** that can be stepped by hand, awaited from other tasks, or
//!   iterated as lazy generators
//! - **Error channels** choosing how failures show up in a task's result:
//!   discarded, unified into one [`Error`], or kept as a tagged [`ErrorSet`]
//! - A **single-worker scheduler** stepping submitted tasks round-robin
//! - A **callback bridge** turning "call me back later" APIs into a blocking
//!   call a task body can make directly
//! - **Combinators** ([`all_of`], [`any_of`]) over groups of tasks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepwise::{Scheduler, Task};
//!
//! fn inner() -> Task<i32> {
//!     Task::new(async { Ok(10) })
//! }
//!
//! fn outer(x: i32) -> Task<i32> {
//!     Task::new(async move { Ok(x + inner().await?) })
//! }
//!
//! let scheduler = Scheduler::new();
//! let task = outer(5);
//!
//! scheduler.schedule(&task, true)?;
//! assert_eq!(task.result(), Some(Ok(15)));
//! ```
//!
//! ## Modules
//!
//! - [`task`] — Tasks, step outcomes, generators and lazy sequences
//! - [`channel`] — Error channel strategies
//! - [`bridge`] — Callback bridge handles
//! - [`combinator`] — All-of / any-of combinators
//! - [`error`] — Canonical error and scheduler errors

extern crate self as stepwise;

mod runtime;
mod utils;

pub mod bridge;
pub mod channel;
pub mod combinator;
pub mod error;

pub use bridge::Handle;
pub use channel::{Discard, ErrorChannel, ErrorSet, Set, Single};
pub use combinator::{all_of, any_of};
pub use error::{Error, Failure, SchedulerError};
pub use runtime::scheduler::{Scheduler, SchedulerBuilder};
pub use runtime::task::{self, ContinuationRef, StepOutcome, Task, TaskId, TaskState, Yielder};
pub use runtime::yield_now::yield_now;

pub use stepwise_macros::{ErrorSet, test};

#[doc(hidden)]
pub mod __private {
    use crate::{Failure, Scheduler, Single, Task};

    use std::future::Future;

    /// Return types accepted from a `#[stepwise::test]` body.
    pub trait IntoTestResult {
        fn into_test_result(self) -> Result<(), Failure>;
    }

    impl IntoTestResult for () {
        fn into_test_result(self) -> Result<(), Failure> {
            Ok(())
        }
    }

    impl<E: Into<Failure>> IntoTestResult for Result<(), E> {
        fn into_test_result(self) -> Result<(), Failure> {
            self.map_err(Into::into)
        }
    }

    /// Runs a test body as a task on a fresh scheduler and fails the test
    /// if the body failed.
    pub fn run_test<F>(body: F)
    where
        F: Future + Send + 'static,
        F::Output: IntoTestResult,
    {
        let scheduler = Scheduler::new();
        let task = Task::<(), Single>::new(async move { body.await.into_test_result() });

        if let Err(err) = scheduler.schedule(&task, true) {
            panic!("test task was not driven to completion: {err}");
        }

        if let Some(Err(err)) = task.take_result() {
            panic!("{err}");
        }
    }
}
