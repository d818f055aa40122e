//! Raw lifecycle states stored in a task record's atomic state word.

/// The body has not run yet.
pub(crate) const NOT_STARTED: usize = 0;

/// The body is being polled by exactly one driver.
///
/// Reaching this state through a compare-exchange is what grants a driver
/// exclusive access to the body.
pub(crate) const RUNNING: usize = 1;

/// The body is suspended while awaiting another task.
pub(crate) const SUSPENDED_ON_SUBTASK: usize = 2;

/// The body is suspended after yielding (with or without a value).
pub(crate) const SUSPENDED_ON_YIELD: usize = 3;

/// The body is blocked inside a callback bridge wait.
///
/// The driving thread still owns the body; this state is only a more
/// precise reading of `RUNNING` for observers.
pub(crate) const SUSPENDED_ON_CALLBACK: usize = 4;

/// The body returned or failed. Terminal.
pub(crate) const COMPLETED: usize = 5;

/// Returns `true` if a driver may claim the body from `state`.
pub(crate) fn is_resumable(state: usize) -> bool {
    matches!(state, NOT_STARTED | SUSPENDED_ON_SUBTASK | SUSPENDED_ON_YIELD)
}

/// Observable lifecycle of a [`Task`](crate::Task).
///
/// ```text
/// NotStarted -> Running -> {SuspendedOnSubtask | SuspendedOnYield | SuspendedOnExternalCallback}
///            -> Running -> ... -> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Created, body not yet executed.
    NotStarted,
    /// A driver is currently stepping the body.
    Running,
    /// Suspended while awaiting another task.
    SuspendedOnSubtask,
    /// Suspended after yielding.
    SuspendedOnYield,
    /// Blocked on an external callback through the bridge.
    SuspendedOnExternalCallback,
    /// Finished with a value or a failure.
    Completed,
}

impl TaskState {
    pub(crate) fn from_raw(raw: usize) -> Self {
        match raw {
            NOT_STARTED => Self::NotStarted,
            RUNNING => Self::Running,
            SUSPENDED_ON_SUBTASK => Self::SuspendedOnSubtask,
            SUSPENDED_ON_YIELD => Self::SuspendedOnYield,
            SUSPENDED_ON_CALLBACK => Self::SuspendedOnExternalCallback,
            _ => Self::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_parked_states_are_resumable() {
        assert!(is_resumable(NOT_STARTED));
        assert!(is_resumable(SUSPENDED_ON_SUBTASK));
        assert!(is_resumable(SUSPENDED_ON_YIELD));

        assert!(!is_resumable(RUNNING));
        assert!(!is_resumable(SUSPENDED_ON_CALLBACK));
        assert!(!is_resumable(COMPLETED));
    }
}
