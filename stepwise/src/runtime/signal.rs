use crate::utils::lock;

use std::mem;
use std::sync::{Arc, Condvar, Mutex};
use std::task::{RawWaker, RawWakerVTable, Waker};
use std::time::Duration;

/// A one-bit, thread-blocking notification.
///
/// A thread parks in [`wait_timeout`](Self::wait_timeout) until some other
/// thread calls [`notify`](Self::notify) (directly or through the waker
/// returned by [`waker`](Self::waker)). A notification sent before the wait
/// begins is not lost: the flag is checked under the lock before parking.
pub(crate) struct Signal {
    notified: Mutex<bool>,
    condvar: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            notified: Mutex::new(false),
            condvar: Condvar::new(),
        })
    }

    /// Sets the flag and wakes the parked thread.
    pub(crate) fn notify(&self) {
        *lock(&self.notified) = true;
        self.condvar.notify_one();
    }

    /// Parks until notified or until `timeout` elapses, then clears the flag.
    ///
    /// Returns `true` if a notification was consumed.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = lock(&self.notified);

        let (mut notified, _) = self
            .condvar
            .wait_timeout_while(guard, timeout, |notified| !*notified)
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        mem::replace(&mut *notified, false)
    }

    /// Returns a waker that notifies this signal.
    pub(crate) fn waker(self: &Arc<Self>) -> Waker {
        let raw = RawWaker::new(Arc::into_raw(self.clone()) as *const (), &VTABLE);

        // Safety: the pointer comes from `Arc::into_raw` and the vtable
        // below keeps the reference count balanced.
        unsafe { Waker::from_raw(raw) }
    }
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Clones the raw waker, incrementing the signal's reference count.
fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<Signal>::from_raw(ptr as *const Signal) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
}

/// Notifies the signal and consumes the waker.
fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Signal>::from_raw(ptr as *const Signal) };
    arc.notify();
}

/// Notifies the signal without consuming the waker.
fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Signal>::from_raw(ptr as *const Signal) };
    arc.notify();
    mem::forget(arc);
}

/// Drops the waker's reference to the signal.
fn drop_raw(ptr: *const ()) {
    unsafe { drop(Arc::<Signal>::from_raw(ptr as *const Signal)) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn notification_before_wait_is_kept() {
        let signal = Signal::new();
        signal.notify();

        assert!(signal.wait_timeout(Duration::from_secs(5)));
        assert!(!signal.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn waker_notifies_across_threads() {
        let signal = Signal::new();
        let waker = signal.waker();

        let notifier = thread::spawn(move || waker.wake());

        assert!(signal.wait_timeout(Duration::from_secs(5)));
        notifier.join().unwrap();
        assert_eq!(Arc::strong_count(&signal), 1);
    }

    #[test]
    fn cloned_wakers_share_the_signal() {
        let signal = Signal::new();
        let waker = signal.waker();
        let copy = waker.clone();
        assert_eq!(Arc::strong_count(&signal), 3);

        drop(waker);
        copy.wake_by_ref();
        assert!(signal.wait_timeout(Duration::from_secs(5)));

        drop(copy);
        assert_eq!(Arc::strong_count(&signal), 1);
    }
}
