//! Background scheduler.
//!
//! This module contains the components driving submitted tasks to
//! completion on a dedicated worker thread:
//! - [`core`]: the scheduler handle, submission, and lifecycle,
//! - [`worker`]: the round-robin worker loop,
//! - [`queue`]: the FIFO run queue and per-entry submitter waiters,
//! - [`builder`]: scheduler configuration.

pub(crate) mod builder;
pub(crate) mod core;
pub(crate) mod queue;
pub(crate) mod worker;

pub use self::core::Scheduler;
pub use builder::SchedulerBuilder;
