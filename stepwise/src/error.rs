//! Failure and error types shared by every part of the runtime.
//!
//! A task body signals failure by returning `Err(Failure)`. How that failure
//! ends up in the task's result is decided by the task's
//! [`ErrorChannel`](crate::channel::ErrorChannel); the canonical [`Error`]
//! defined here is what the single-error channel and the callback bridge
//! report.

use std::any::Any;
use std::io;

use thiserror::Error;

/// A failure raised inside a task body.
///
/// Any error type converts into a `Failure` through `?`, which keeps task
/// bodies free of manual conversions.
pub type Failure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The canonical task error: a message and an optional numeric code.
///
/// Codes usually come from external callback APIs reporting completion
/// through the [`bridge`](crate::bridge).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Error {
    message: String,
    code: Option<i32>,
}

impl Error {
    /// Creates an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Creates an error carrying a numeric code and a message.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the numeric code, if one was reported.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// Converts an arbitrary failure into the canonical error.
    ///
    /// A failure that already is an [`Error`] keeps its code; anything else
    /// is reduced to its display message.
    pub fn from_failure(failure: Failure) -> Self {
        match failure.downcast::<Error>() {
            Ok(error) => *error,
            Err(other) => Self::new(other.to_string()),
        }
    }

    /// Builds an error from a panic payload caught at a task boundary.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_owned()
        };

        Self::new(format!("task panicked: {detail}"))
    }
}

/// Errors reported by the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler was shut down before the task was submitted.
    #[error("scheduler has been shut down")]
    ShutDown,

    /// The scheduler shut down while a submitter was blocked on the task.
    #[error("scheduler shut down before the task completed")]
    Interrupted,

    /// A blocking submission was issued from the scheduler's own worker.
    ///
    /// Waiting there would stop the only thread able to finish the task.
    #[error("blocking submission from the scheduler's own worker thread")]
    BlockingOnWorker,

    /// The worker thread could not be spawned.
    #[error("failed to spawn scheduler worker: {0}")]
    Spawn(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn from_failure_keeps_code_of_canonical_error() {
        let failure: Failure = Box::new(Error::with_code(7, "io failed"));
        let error = Error::from_failure(failure);

        assert_eq!(error.code(), Some(7));
        assert_eq!(error.message(), "io failed");
    }

    #[test]
    fn from_failure_flattens_foreign_errors() {
        let failure: Failure = Box::new(DiskError);
        let error = Error::from_failure(failure);

        assert_eq!(error, Error::new("disk on fire"));
    }

    #[test]
    fn from_panic_reads_string_payloads() {
        let error = Error::from_panic(Box::new(String::from("boom")));
        assert_eq!(error.message(), "task panicked: boom");

        let error = Error::from_panic(Box::new(42_u8));
        assert_eq!(error.message(), "task panicked: unknown panic payload");
    }
}
