use super::core::Slot;
use super::state::SUSPENDED_ON_YIELD;
use crate::channel::ErrorChannel;
use crate::runtime::context;

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Publishes intermediate values from a generator-style task body.
///
/// Handed to the closure passed to [`Task::generator`](crate::Task::generator).
pub struct Yielder<T, C: ErrorChannel<T>> {
    slot: Arc<Slot<C::Output>>,
    _value: PhantomData<fn(T)>,
}

impl<T, C: ErrorChannel<T>> Yielder<T, C> {
    pub(crate) fn new(slot: Arc<Slot<C::Output>>) -> Self {
        Self {
            slot,
            _value: PhantomData,
        }
    }

    /// Publishes `value` as the task's current result and suspends once.
    ///
    /// ```rust,ignore
    /// co.yield_value(n).await;
    /// ```
    pub fn yield_value(&self, value: T) -> YieldValue<C::Output> {
        YieldValue {
            pending: Some(C::success(value)),
            slot: self.slot.clone(),
        }
    }
}

impl<T, C: ErrorChannel<T>> Clone for Yielder<T, C> {
    fn clone(&self) -> Self {
        Self::new(self.slot.clone())
    }
}

/// Future returned by [`Yielder::yield_value`].
///
/// The first poll publishes the value and returns `Pending`; the next poll
/// completes.
pub struct YieldValue<O> {
    pending: Option<O>,
    slot: Arc<Slot<O>>,
}

// The value is never pinned; it is moved into the slot by value.
impl<O> Unpin for YieldValue<O> {}

impl<O> Future for YieldValue<O> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        match self.pending.take() {
            Some(value) => {
                self.slot.publish(value);
                context::note_suspension(SUSPENDED_ON_YIELD);
                Poll::Pending
            }
            None => Poll::Ready(()),
        }
    }
}
