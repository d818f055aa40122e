use super::core::Scheduler;
use crate::error::SchedulerError;

use std::time::Duration;

/// Builder for configuring and creating a [`Scheduler`].
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new()
///     .thread_name("io-bridge")
///     .idle_timeout(Duration::from_millis(50))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SchedulerBuilder {
    /// Name of the worker thread.
    pub(crate) thread_name: String,

    /// Stack size of the worker thread, if overridden.
    pub(crate) stack_size: Option<usize>,

    /// Longest time an idle worker sleeps before re-checking its queue.
    pub(crate) idle_timeout: Duration,
}

impl SchedulerBuilder {
    /// Creates a builder with the default configuration.
    ///
    /// The worker is named `stepwise-scheduler`, uses the platform's
    /// default stack size, and re-checks an idle queue every 10ms.
    pub fn new() -> Self {
        Self {
            thread_name: String::from("stepwise-scheduler"),
            stack_size: None,
            idle_timeout: Duration::from_millis(10),
        }
    }

    /// Sets the worker thread's name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the worker thread's stack size in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes == 0`.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "stack_size must be > 0");

        self.stack_size = Some(bytes);
        self
    }

    /// Sets how long an idle worker sleeps before re-checking its queue.
    ///
    /// Submissions and shutdown wake the worker early regardless.
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "idle_timeout must be > 0");

        self.idle_timeout = timeout;
        self
    }

    /// Builds the scheduler and starts its worker thread.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        Scheduler::start(self)
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
