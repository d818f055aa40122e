use super::ErrorChannel;
use crate::error::Failure;

/// Error channel that drops failures.
///
/// The result type is the bare value. When a body fails, the slot keeps
/// whatever it held before: the last yielded value, or nothing at all, in
/// which case awaiting the task produces `T::default()`.
///
/// Nothing distinguishes a failed task from a successful one under this
/// channel. The failure is logged at `warn` level and otherwise lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<T> ErrorChannel<T> for Discard
where
    T: Default + Send + 'static,
{
    type Output = T;

    fn success(value: T) -> T {
        value
    }

    fn failure(failure: Failure, _slot: &mut Option<T>) {
        log::warn!("discarding task failure: {failure}");
    }

    fn vacant() -> T {
        T::default()
    }
}
