use super::ErrorChannel;
use crate::error::{Error, Failure};

/// Error channel funnelling every failure into the canonical [`Error`].
///
/// This is the default channel of [`Task`](crate::Task).
#[derive(Debug, Clone, Copy, Default)]
pub struct Single;

impl<T> ErrorChannel<T> for Single
where
    T: Send + 'static,
{
    type Output = Result<T, Error>;

    fn success(value: T) -> Self::Output {
        Ok(value)
    }

    fn failure(failure: Failure, slot: &mut Option<Self::Output>) {
        let error = Error::from_failure(failure);
        log::debug!("task failed: {error}");
        *slot = Some(Err(error));
    }

    fn vacant() -> Self::Output {
        Err(Error::new("task completed without producing a result"))
    }
}
