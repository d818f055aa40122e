use std::fmt;
use std::marker::PhantomData;

use super::ErrorChannel;
use crate::error::{Error, Failure};

/// A closed set of error kinds a task may fail with.
///
/// Implementors are enums with one variant per declared kind plus one
/// reserved fallback variant holding the canonical [`Error`]. The usual way
/// to implement it is `#[derive(ErrorSet)]`. Awaiting a task hands each
/// awaiter a copy of the result, so sets used that way also derive `Clone`:
///
/// ```rust,ignore
/// use stepwise::{Error, ErrorSet};
///
/// #[derive(Debug, Clone, thiserror::Error, ErrorSet)]
/// enum FetchError {
///     #[error(transparent)]
///     Float(std::num::ParseFloatError),
///     #[error(transparent)]
///     Parse(std::num::ParseIntError),
///     #[fallback]
///     #[error(transparent)]
///     Other(Error),
/// }
/// ```
pub trait ErrorSet: std::error::Error + Send + Sync + Sized + 'static {
    /// Classifies a raised failure.
    ///
    /// A failure that already is `Self` is returned unchanged, one whose
    /// concrete type matches a declared kind is wrapped in that kind, and
    /// anything else becomes the fallback kind.
    fn classify(failure: Failure) -> Self;

    /// Wraps an error into the reserved fallback kind.
    fn fallback(error: Error) -> Self;

    /// Returns `true` if `self` is the reserved fallback kind.
    fn is_fallback(&self) -> bool;
}

/// Error channel preserving failures as a tagged union `K`.
pub struct Set<K>(PhantomData<fn() -> K>);

impl<K> fmt::Debug for Set<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Set")
    }
}

impl<T, K> ErrorChannel<T> for Set<K>
where
    T: Send + 'static,
    K: ErrorSet,
{
    type Output = Result<T, K>;

    fn success(value: T) -> Self::Output {
        Ok(value)
    }

    fn failure(failure: Failure, slot: &mut Option<Self::Output>) {
        let kind = K::classify(failure);
        if kind.is_fallback() {
            log::debug!("task failed with undeclared error kind: {kind}");
        } else {
            log::debug!("task failed: {kind}");
        }
        *slot = Some(Err(kind));
    }

    fn vacant() -> Self::Output {
        Err(K::fallback(Error::new(
            "task completed without producing a result",
        )))
    }
}
