//! Error channels.
//!
//! An error channel decides how failures raised by a task body are
//! represented in the task's result. Every [`Task`](crate::Task) is generic
//! over its channel, so the stepping state machine exists once and the
//! channel only contributes two conversions:
//!
//! - wrapping a produced value ([`ErrorChannel::success`]),
//! - translating a failure at the body's catch boundary
//!   ([`ErrorChannel::failure`]).
//!
//! Three channels are provided:
//!
//! - [`Discard`]: failures are dropped and the result slot keeps whatever
//!   it held before. Only use it where failures cannot happen or do not
//!   matter.
//! - [`Single`]: every failure becomes the canonical [`Error`](crate::Error).
//! - [`Set`]: failures are classified into a user-declared
//!   [`ErrorSet`], with a reserved fallback kind for anything undeclared.

mod discard;
mod set;
mod single;

pub use discard::Discard;
pub use set::{ErrorSet, Set};
pub use single::Single;

use crate::error::Failure;

/// Strategy describing how a task's outcome is stored in its result slot.
///
/// The channel is a zero-sized marker type; all methods are associated
/// functions.
pub trait ErrorChannel<T>: Send + Sync + 'static {
    /// What [`Task::result`](crate::Task::result) and `task.await` produce.
    type Output: Send + 'static;

    /// Wraps a value produced by the body (yielded or returned).
    fn success(value: T) -> Self::Output;

    /// Translates a failure raised by the body into the result slot.
    ///
    /// Called exactly once per failure, at the boundary closest to where it
    /// originated and before any caller is resumed.
    fn failure(failure: Failure, slot: &mut Option<Self::Output>);

    /// The value reported when a completed task left its slot empty.
    fn vacant() -> Self::Output;
}
