//! Condition variable implementation.
//!
//! Consumers of a [`TimerQueue`](crate::TimerQueue) park on a condition
//! variable until either new work arrives or the earliest deadline elapses.
//! This wrapper adds deadline-bounded waits on top of `parking_lot`'s condvar.

use std::time::Instant;

use crate::MutexGuard;

/// A condition variable.
///
/// Condition variables represent the ability to block a thread such that
/// it consumes no CPU time while waiting for an event to occur. Unlike
/// `std::sync::Condvar`, this type does not implement poisoning.
///
/// # Examples
///
/// ```
/// use prometheus_timer_queue::{Condvar, Mutex};
/// use std::sync::Arc;
/// use std::thread;
///
/// let pair = Arc::new((Mutex::new(false), Condvar::new()));
/// let pair2 = Arc::clone(&pair);
///
/// thread::spawn(move || {
///     let (lock, cvar) = &*pair2;
///     *lock.lock() = true;
///     cvar.notify_all();
/// });
///
/// let (lock, cvar) = &*pair;
/// let mut started = lock.lock();
/// while !*started {
///     cvar.wait(&mut started);
/// }
/// ```
#[derive(Debug, Default)]
pub struct Condvar {
    inner: parking_lot::Condvar,
}

impl Condvar {
    /// Creates a new condition variable.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: parking_lot::Condvar::new(),
        }
    }

    /// Blocks the current thread until this condition variable receives a notification.
    ///
    /// The mutex behind `guard` is released while blocked and re-acquired
    /// before returning. Spurious wakeups are possible; callers re-check their
    /// predicate in a loop.
    #[inline]
    pub fn wait<T>(&self, guard: &mut MutexGuard<'_, T>) {
        self.inner.wait(guard);
    }

    /// Blocks until notified or until `deadline` is reached.
    ///
    /// Returns `true` if the wait ended because the deadline passed.
    ///
    /// # Examples
    ///
    /// ```
    /// use prometheus_timer_queue::{Condvar, Mutex};
    /// use std::time::{Duration, Instant};
    ///
    /// let lock = Mutex::new(());
    /// let cvar = Condvar::new();
    /// let mut guard = lock.lock();
    ///
    /// let deadline = Instant::now() + Duration::from_millis(5);
    /// assert!(cvar.wait_until(&mut guard, deadline));
    /// assert!(Instant::now() >= deadline);
    /// ```
    #[inline]
    pub fn wait_until<T>(&self, guard: &mut MutexGuard<'_, T>, deadline: Instant) -> bool {
        self.inner.wait_until(guard, deadline).timed_out()
    }

    /// Wakes up all blocked threads on this condvar.
    #[inline]
    pub fn notify_all(&self) {
        self.inner.notify_all();
    }
}
