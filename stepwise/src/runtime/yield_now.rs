use crate::runtime::context;
use crate::runtime::task::state::SUSPENDED_ON_YIELD;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that suspends the enclosing task body exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    /// On the first poll the body suspends; the next step completes it.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.0 {
            self.0 = true;
            context::note_suspension(SUSPENDED_ON_YIELD);
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        Poll::Ready(())
    }
}

/// Suspends the current task body once without producing a value.
///
/// The body resumes on its next step. This lets a long-running body hand
/// the scheduler's worker to other tasks.
///
/// # Examples
///
/// ```rust,ignore
/// Task::<()>::new(async {
///     while !ready() {
///         yield_now().await;
///     }
///     Ok(())
/// });
/// ```
pub async fn yield_now() {
    YieldOnce(false).await
}
