//! Task primitives.
//!
//! This module defines the resumable task and everything attached to it:
//!
//! - the continuation record and its stepping state machine,
//! - the await adapter linking a callee back to its caller,
//! - the yielder used by generator-style bodies,
//! - the lazy sequence adapter,
//! - the explicit step outcome used for symmetric transfer.

pub(crate) mod continuation;
pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod iter;
pub(crate) mod state;
pub(crate) mod yielder;

pub use continuation::{ContinuationRef, StepOutcome, TaskId};
pub use self::core::Task;
pub use handle::Await;
pub use iter::Iter;
pub use state::TaskState;
pub use yielder::{YieldValue, Yielder};
