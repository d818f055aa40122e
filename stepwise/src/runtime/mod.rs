//! Core runtime components.
//!
//! This module contains the fundamental building blocks of the runtime:
//! - the resumable task and its continuation record,
//! - the background scheduler and its worker loop,
//! - the per-thread context linking an awaiting task to the task it awaits,
//! - cooperative yielding.
//!
//! Most users will interact with the re-exports at the crate root rather
//! than with this module directly.

pub(crate) mod context;
pub(crate) mod scheduler;
pub(crate) mod signal;
pub(crate) mod yield_now;

pub mod task;
